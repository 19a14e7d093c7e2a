//! Work item processor
//!
//! Drives one site path from `Fresh` to a terminal state:
//!
//! 1. Try the preferred strategy; if it loads but finds nothing, try the other
//! 2. A strategy that cannot load its page ends the attempt immediately
//! 3. Found content goes through the quality gate and is written to disk
//! 4. Any failure consults the item's retry budget; an exhausted budget
//!    appends a record to the run's failure ledger
//!
//! No error crosses [`ItemProcessor::process`]; the worker only sees an
//! [`ItemOutcome`].

use chrono::Utc;
use std::sync::Arc;

use super::coordinator::RunContext;
use super::pool::WorkItem;
use super::renderer::Page;
use super::strategy::{FetchResult, Retrieval, Retriever, Strategy};
use crate::config::{PipelineSettings, QualityMode, QualityThresholds, StrategyPriority};
use crate::output::{progress_line, DocumentNotes, DocumentWriter};
use crate::state::{FailureKind, ItemError, ItemState, RetryDecision, RetryPolicy};
use crate::storage::FailureRecord;

/// Status line written on documents recovered by a resume run
const RECOVERED_STATUS: &str = "recovered on retry";

/// Terminal outcome of one work item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Content was written to disk
    Saved { strategy: Strategy, suspicious: bool },
    /// Retry budget ran out and a failure record was appended
    Failed { kind: FailureKind, retries: u32 },
    /// The run was cancelled while the item was in flight
    Abandoned,
}

/// Result of the quality gate for content that may be saved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateVerdict {
    /// At or above the save threshold
    Complete,
    /// Below the save threshold but above the floor, lenient mode only
    Suspicious { length: usize },
}

/// Applies the save-time quality gate to converted Markdown
///
/// Length is the character count of the trimmed Markdown. Strict mode saves
/// iff `length >= save_min`. Lenient mode saves iff `length >= floor` and
/// flags anything under `save_min` as suspicious.
pub fn quality_gate(
    mode: QualityMode,
    thresholds: &QualityThresholds,
    path: &str,
    markdown: &str,
) -> Result<GateVerdict, ItemError> {
    let length = markdown.trim().chars().count();

    if length >= thresholds.save_min {
        return Ok(GateVerdict::Complete);
    }

    let threshold = match mode {
        QualityMode::Lenient if length >= thresholds.floor => {
            return Ok(GateVerdict::Suspicious { length })
        }
        QualityMode::Lenient => thresholds.floor,
        QualityMode::Strict => thresholds.save_min,
    };

    Err(ItemError::ShortContent {
        path: path.to_string(),
        length,
        threshold,
    })
}

/// Tracks an item's state and the last URL it tried
struct ItemTracker<'a> {
    path: &'a str,
    state: ItemState,
    last_url: String,
}

impl<'a> ItemTracker<'a> {
    fn new(path: &'a str) -> Self {
        Self {
            path,
            state: ItemState::Fresh,
            last_url: String::new(),
        }
    }

    fn advance(&mut self, next: ItemState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid item transition {} -> {}",
            self.state,
            next
        );
        tracing::trace!(path = %self.path, from = %self.state, to = %next, "Item state");
        self.state = next;
    }
}

/// Runs work items through strategy fallback, quality gate and retries
pub struct ItemProcessor {
    retriever: Arc<dyn Retriever>,
    writer: DocumentWriter,
    mode: QualityMode,
    priority: StrategyPriority,
    thresholds: QualityThresholds,
    retry: RetryPolicy,
    context: Arc<RunContext>,
}

impl ItemProcessor {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        writer: DocumentWriter,
        settings: &PipelineSettings,
        context: Arc<RunContext>,
    ) -> Self {
        Self {
            retriever,
            writer,
            mode: settings.mode,
            priority: settings.priority,
            thresholds: settings.quality,
            retry: settings.retry.clone(),
            context,
        }
    }

    /// Processes one item to a terminal outcome
    ///
    /// # Arguments
    ///
    /// * `page` - The calling worker's page session
    /// * `item` - The item popped from the queue
    /// * `worker` - Worker id, used in log lines
    pub async fn process(&self, page: &mut dyn Page, item: &WorkItem, worker: usize) -> ItemOutcome {
        let cancel = &self.context.cancel;
        let mut tracker = ItemTracker::new(&item.path);
        let mut budget = self.retry.budget();
        let first = self.first_strategy(item);

        loop {
            if cancel.is_cancelled() {
                return self.abandon(&mut tracker, worker);
            }
            self.context.stats.record_attempt();

            let attempt = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = self.attempt(page, first, &mut tracker) => Some(result),
            };
            let Some(result) = attempt else {
                return self.abandon(&mut tracker, worker);
            };

            let error = match result {
                Ok(fetched) => {
                    tracker.advance(ItemState::QualityCheck);
                    match self.save(item, &fetched).await {
                        Ok(verdict) => {
                            tracker.advance(ItemState::Saved);
                            return self.finish_saved(item, &fetched, verdict, budget.used(), worker);
                        }
                        Err(e) => e,
                    }
                }
                Err(e) => e,
            };

            let kind = error.kind();
            match budget.record_failure(kind) {
                RetryDecision::Retry { delay, retry } => {
                    tracker.advance(ItemState::Retrying);
                    self.context.stats.record_retry(kind);
                    tracing::warn!(
                        worker,
                        path = %item.path,
                        kind = %kind,
                        retry,
                        max_retries = budget.max_retries(),
                        delay_ms = delay.as_millis() as u64,
                        "Attempt failed: {}",
                        error
                    );

                    let waited = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => false,
                        _ = tokio::time::sleep(delay) => true,
                    };
                    if !waited {
                        return self.abandon(&mut tracker, worker);
                    }
                }
                RetryDecision::GiveUp { retries } => {
                    tracker.advance(ItemState::Failed);
                    return self.finish_failed(item, &tracker.last_url, error, retries, worker);
                }
            }
        }
    }

    /// Strategy an attempt starts with
    ///
    /// Resume runs start with whichever strategy produced the item's recorded
    /// URL. An item that failed before any URL was recorded starts rendered.
    fn first_strategy(&self, item: &WorkItem) -> Strategy {
        match (self.priority, &item.prior_attempt) {
            (StrategyPriority::PriorUrlFirst, Some(prior)) if prior.last_used_url.is_empty() => {
                Strategy::Rendered
            }
            (StrategyPriority::PriorUrlFirst, Some(prior)) => {
                self.retriever.strategy_of(&prior.last_used_url)
            }
            _ => Strategy::Direct,
        }
    }

    /// One attempt: the preferred strategy, then the other if it found nothing
    async fn attempt(
        &self,
        page: &mut dyn Page,
        first: Strategy,
        tracker: &mut ItemTracker<'_>,
    ) -> Result<FetchResult, ItemError> {
        let path = tracker.path;
        let mut not_found_url = None;

        for strategy in [first, first.other()] {
            tracker.advance(match strategy {
                Strategy::Direct => ItemState::TryingDirect,
                Strategy::Rendered => ItemState::TryingRendered,
            });
            tracker.last_url = self.retriever.url_for(strategy, path);

            match self.retriever.retrieve(page, strategy, path).await? {
                Retrieval::Found(result) => return Ok(result),
                Retrieval::NotFound => {
                    tracing::debug!(path = %path, strategy = %strategy, "Not found, trying next strategy");
                    not_found_url.get_or_insert_with(|| tracker.last_url.clone());
                }
                Retrieval::NoContent => {
                    tracing::debug!(path = %path, strategy = %strategy, "No content, trying next strategy");
                }
            }
        }

        Err(match not_found_url {
            Some(url) => ItemError::NotFound { url },
            None => ItemError::EmptyContent {
                path: path.to_string(),
            },
        })
    }

    /// Quality gate and document write
    async fn save(&self, item: &WorkItem, fetched: &FetchResult) -> Result<GateVerdict, ItemError> {
        let verdict = quality_gate(self.mode, &self.thresholds, &item.path, &fetched.markdown)?;

        let notes = DocumentNotes {
            status: item
                .prior_attempt
                .as_ref()
                .map(|_| RECOVERED_STATUS.to_string()),
            suspicious: match verdict {
                GateVerdict::Complete => None,
                GateVerdict::Suspicious { length } => Some(format!(
                    "content is short ({} chars) and may be incomplete; check it against the live page",
                    length
                )),
            },
        };

        self.writer
            .write(fetched, &notes)
            .await
            .map_err(|e| ItemError::Write {
                path: item.path.clone(),
                message: e.to_string(),
            })?;
        Ok(verdict)
    }

    fn finish_saved(
        &self,
        item: &WorkItem,
        fetched: &FetchResult,
        verdict: GateVerdict,
        retries: u32,
        worker: usize,
    ) -> ItemOutcome {
        let suspicious = matches!(verdict, GateVerdict::Suspicious { .. });
        let done = self.context.stats.record_success(fetched.strategy, suspicious);

        tracing::info!(
            worker,
            path = %item.path,
            strategy = %fetched.strategy,
            retries,
            suspicious,
            "{} saved ({} chars)",
            progress_line(done, self.context.stats.total()),
            fetched.markdown.trim().chars().count()
        );

        ItemOutcome::Saved {
            strategy: fetched.strategy,
            suspicious,
        }
    }

    fn finish_failed(
        &self,
        item: &WorkItem,
        last_url: &str,
        error: ItemError,
        retries: u32,
        worker: usize,
    ) -> ItemOutcome {
        let kind = error.kind();
        self.context.failures.record(FailureRecord {
            path: item.path.clone(),
            last_used_url: last_url.to_string(),
            error_message: error.to_string(),
            error_kind: kind,
            retry_count: retries,
            timestamp: Utc::now(),
            prior_error: item
                .prior_attempt
                .as_ref()
                .map(|prior| prior.error_message.clone()),
        });
        let done = self.context.stats.record_failure(kind);

        tracing::error!(
            worker,
            path = %item.path,
            kind = %kind,
            retries,
            "{} failed: {}",
            progress_line(done, self.context.stats.total()),
            error
        );

        ItemOutcome::Failed { kind, retries }
    }

    fn abandon(&self, tracker: &mut ItemTracker<'_>, worker: usize) -> ItemOutcome {
        tracker.advance(ItemState::Abandoned);
        tracing::debug!(worker, path = %tracker.path, "Item abandoned on cancellation");
        ItemOutcome::Abandoned
    }
}
