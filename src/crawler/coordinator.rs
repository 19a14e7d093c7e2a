//! Run coordinator - fresh and resume pipeline orchestration
//!
//! Both pipelines follow the same shape:
//! - Seed a work queue (from start-page discovery or from a failure ledger)
//! - Drain it with the worker pool under run-scoped statistics and ledger
//! - Persist whatever failed
//! - Print the summary
//!
//! A fresh run writes `failed_links.json`; a resume run writes a new,
//! timestamped ledger and never touches the one it was seeded from.

use chrono::Utc;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::convert::Html2MdConverter;
use super::discovery::{discover_paths, DiscoveryTimings};
use super::extractor::ReadabilityExtractor;
use super::pool::{run_pool, PoolConfig, WorkItem, WorkQueue};
use super::processor::ItemProcessor;
use super::renderer::{HttpRenderer, Renderer};
use super::strategy::StrategySet;
use crate::config::{Config, PipelineSettings};
use crate::output::{format_summary, DocumentWriter, RunKind, RunStatistics, StatsSnapshot};
use crate::storage::{
    load_ledger, save_ledger, FailureLedger, FailureRecord, LedgerFile, LedgerPaths,
};
use crate::url::SiteUrls;
use crate::HarvestError;

/// State shared by every worker of one pipeline invocation
#[derive(Debug)]
pub struct RunContext {
    pub stats: RunStatistics,
    pub failures: FailureLedger,
    pub cancel: CancellationToken,
}

impl RunContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            stats: RunStatistics::new(),
            failures: FailureLedger::new(),
            cancel,
        }
    }
}

/// Where a run's work items come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedSource {
    /// Links discovered on the configured start page (fresh run)
    Discover,
    /// Records of a previously written failure ledger (resume run)
    Ledger(PathBuf),
}

impl SeedSource {
    pub fn kind(&self) -> RunKind {
        match self {
            SeedSource::Discover => RunKind::Fresh,
            SeedSource::Ledger(_) => RunKind::Resume,
        }
    }
}

/// What a finished (or interrupted) run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub kind: RunKind,
    pub stats: StatsSnapshot,
    pub failures: Vec<FailureRecord>,
    /// Files the failure ledger was written to, if there were failures and
    /// writing succeeded
    pub ledger_paths: Option<LedgerPaths>,
    pub interrupted: bool,
}

/// Orchestrates one pipeline run
pub struct Coordinator {
    config: Config,
    renderer: Arc<dyn Renderer>,
}

impl Coordinator {
    /// Creates a coordinator that opens page sessions from `renderer`
    pub fn new(config: Config, renderer: Arc<dyn Renderer>) -> Self {
        Self { config, renderer }
    }

    /// Runs the fresh or resume pipeline to completion
    ///
    /// # Arguments
    ///
    /// * `seed` - Discovery for a fresh run, a ledger path for a resume run
    /// * `cancel` - Cancelling this token abandons in-flight items; failures
    ///   recorded so far are still persisted and the summary is still printed
    ///
    /// # Returns
    ///
    /// * `Ok(RunOutcome)` - The pool ran, or the run was interrupted before it
    ///   could start
    /// * `Err(HarvestError)` - Seeding failed, or a worker failed; in the latter
    ///   case the ledger and summary have already been written
    pub async fn run(
        &self,
        seed: SeedSource,
        cancel: CancellationToken,
    ) -> Result<RunOutcome, HarvestError> {
        let kind = seed.kind();
        let settings = match kind {
            RunKind::Fresh => PipelineSettings::fresh(&self.config),
            RunKind::Resume => PipelineSettings::resume(&self.config),
        };
        let urls = SiteUrls::from_config(&self.config.site)?;

        let items = match &seed {
            SeedSource::Discover => match self.discover(&urls, &settings, &cancel).await {
                Ok(paths) => paths.into_iter().map(WorkItem::new).collect(),
                Err(HarvestError::Interrupted) => {
                    tracing::warn!("Run interrupted during link discovery");
                    return Ok(interrupted_before_start(kind));
                }
                Err(e) => return Err(e),
            },
            SeedSource::Ledger(path) => {
                tracing::info!("Loading failure ledger {}", path.display());
                seed_from_ledger(load_ledger(path)?)
            }
        };

        let context = Arc::new(RunContext::new(cancel.clone()));
        context.stats.set_total(items.len());
        tracing::info!("Seeded {} work items", items.len());

        let retriever = Arc::new(StrategySet::new(
            urls,
            settings.fetch.clone(),
            Box::new(ReadabilityExtractor::new(settings.quality.extract_min)),
            Box::new(Html2MdConverter),
        ));
        let writer = DocumentWriter::new(&self.config.output.output_dir);
        let processor = Arc::new(ItemProcessor::new(
            retriever,
            writer,
            &settings,
            context.clone(),
        ));

        let pool_result = run_pool(
            Arc::new(WorkQueue::new(items)),
            self.renderer.clone(),
            processor,
            PoolConfig {
                concurrency: settings.concurrency,
                item_delay: settings.item_delay,
            },
            cancel.clone(),
        )
        .await;

        let interrupted = cancel.is_cancelled();
        if interrupted {
            tracing::warn!("Run interrupted; flushing failures recorded so far");
        }

        let failures = context.failures.snapshot();
        let ledger_paths = persist_failures(kind, Path::new(&self.config.output.ledger_dir), &failures);

        let stats = context.stats.snapshot();
        let report = ledger_paths.as_ref().map(|p| p.report.as_path());
        println!("\n{}", format_summary(&stats, kind, report, interrupted));

        if let Err(e) = pool_result {
            return Err(HarvestError::Worker(e));
        }

        Ok(RunOutcome {
            kind,
            stats,
            failures,
            ledger_paths,
            interrupted,
        })
    }

    /// Opens a session just for the start page and collects target paths
    async fn discover(
        &self,
        urls: &SiteUrls,
        settings: &PipelineSettings,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, HarvestError> {
        let timings = DiscoveryTimings {
            navigation_timeout: settings.fetch.navigation_timeout,
            settle: Duration::from_millis(self.config.fetch.discovery_settle_ms),
        };

        let mut page = self.renderer.open_page().await?;
        let result = discover_paths(page.as_mut(), urls, &timings, &settings.retry, cancel).await;
        page.close().await;
        result
    }
}

/// Outcome of a run cancelled before any item was queued
fn interrupted_before_start(kind: RunKind) -> RunOutcome {
    let stats = RunStatistics::new().snapshot();
    println!("\n{}", format_summary(&stats, kind, None, true));

    RunOutcome {
        kind,
        stats,
        failures: Vec::new(),
        ledger_paths: None,
        interrupted: true,
    }
}

/// Turns ledger records into work items, keeping the first record per path
fn seed_from_ledger(ledger: LedgerFile) -> Vec<WorkItem> {
    let mut seen = HashSet::new();
    ledger
        .failed_links
        .into_iter()
        .filter(|record| seen.insert(record.path.clone()))
        .map(WorkItem::resumed)
        .collect()
}

/// Writes the run's failure ledger; a write failure is logged, not raised
fn persist_failures(
    kind: RunKind,
    dir: &Path,
    failures: &[FailureRecord],
) -> Option<LedgerPaths> {
    if failures.is_empty() {
        return None;
    }

    let now = Utc::now();
    let paths = match kind {
        RunKind::Fresh => LedgerPaths::fresh(dir),
        RunKind::Resume => LedgerPaths::resume(dir, now),
    };

    match save_ledger(&paths, &LedgerFile::new(failures.to_vec(), now)) {
        Ok(()) => {
            tracing::info!(
                "Wrote {} failure records to {}",
                failures.len(),
                paths.json.display()
            );
            Some(paths)
        }
        Err(e) => {
            tracing::error!("Failed to write failure ledger: {}", e);
            None
        }
    }
}

/// Runs a complete pipeline with the HTTP renderer and Ctrl-C handling
///
/// This is the main entry point used by the binary. Ctrl-C cancels the run;
/// the pipeline then winds down, persists its failures and prints its summary.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use doc_harvest::config::load_config;
/// use doc_harvest::crawler::{run_harvest, SeedSource};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// run_harvest(config, SeedSource::Discover).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(config: Config, seed: SeedSource) -> Result<RunOutcome, HarvestError> {
    let renderer = Arc::new(HttpRenderer::new(&config.fetch.user_agent)?);
    let coordinator = Coordinator::new(config, renderer);

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    let listener = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping workers");
            signal_cancel.cancel();
        }
    });

    let result = coordinator.run(seed, cancel).await;
    listener.abort();
    result
}
