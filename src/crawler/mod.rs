//! Crawler module for harvesting documentation pages
//!
//! This module contains the fetch pipeline, including:
//! - Page sessions and the two retrieval strategies
//! - Main-content extraction and Markdown conversion
//! - The per-item processor with retries and the quality gate
//! - The worker pool and the run coordinator

mod convert;
mod coordinator;
mod discovery;
mod extractor;
mod pool;
mod processor;
mod renderer;
mod strategy;

#[cfg(test)]
mod testing;

pub use convert::{Converter, Html2MdConverter};
pub use coordinator::{run_harvest, Coordinator, RunContext, RunOutcome, SeedSource};
pub use discovery::{discover_paths, extract_site_paths, DiscoveryTimings};
pub use extractor::{Extracted, Extractor, ReadabilityExtractor};
pub use pool::{run_pool, PoolConfig, PoolReport, WorkItem, WorkQueue, WorkerError};
pub use processor::{quality_gate, GateVerdict, ItemOutcome, ItemProcessor};
pub use renderer::{build_http_client, HttpRenderer, Page, RenderError, Renderer, WaitUntil};
pub use strategy::{FetchResult, Retrieval, Retriever, Strategy, StrategySet};

use crate::config::Config;
use std::path::PathBuf;

/// Harvests the configured site from scratch
///
/// Discovers target links on the start page, fetches every one of them and
/// writes `failed_links.json` for whatever could not be saved.
///
/// # Arguments
///
/// * `config` - The harvest configuration
///
/// # Returns
///
/// * `Ok(RunOutcome)` - The run finished or was interrupted
/// * `Err(HarvestError)` - Discovery failed or a worker could not run
pub async fn harvest(config: Config) -> crate::Result<RunOutcome> {
    run_harvest(config, SeedSource::Discover).await
}

/// Re-attempts the items recorded in a failure ledger
///
/// The input ledger is left untouched; items that still fail go to a new,
/// timestamped ledger.
pub async fn resume(config: Config, ledger: PathBuf) -> crate::Result<RunOutcome> {
    run_harvest(config, SeedSource::Ledger(ledger)).await
}
