//! Effective per-pipeline settings
//!
//! The fresh and resume pipelines run the same code. What differs between them
//! is captured here: quality-gate mode, strategy priority, pool size, timings
//! and retry budgets.

use crate::config::types::Config;
use crate::state::RetryPolicy;
use std::time::Duration;

/// How the quality gate treats content below the save threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityMode {
    /// Sub-threshold content is a failure
    Strict,
    /// Sub-threshold content above the floor is saved with an annotation
    Lenient,
}

/// Which retrieval strategy an attempt starts with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyPriority {
    /// Always start with the direct strategy
    DirectFirst,
    /// Start with whichever strategy produced the item's previously recorded URL
    PriorUrlFirst,
}

/// Timings and selectors used by the retrieval strategies
#[derive(Debug, Clone)]
pub struct FetchTimings {
    pub navigation_timeout: Duration,
    pub direct_settle: Duration,
    pub render_settle: Duration,
    pub selector_timeout: Duration,
    pub content_selector: String,
}

/// Content length thresholds, in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityThresholds {
    pub extract_min: usize,
    pub save_min: usize,
    pub floor: usize,
}

/// Everything one pipeline run needs besides the site description
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub mode: QualityMode,
    pub priority: StrategyPriority,
    pub concurrency: usize,
    pub item_delay: Duration,
    pub retry: RetryPolicy,
    pub fetch: FetchTimings,
    pub quality: QualityThresholds,
}

impl PipelineSettings {
    /// Settings for a fresh harvest: strict gate, direct strategy first
    pub fn fresh(config: &Config) -> Self {
        let pipeline = &config.pipeline;
        let fetch = &config.fetch;

        Self {
            mode: QualityMode::Strict,
            priority: StrategyPriority::DirectFirst,
            concurrency: pipeline.concurrency as usize,
            item_delay: Duration::from_millis(pipeline.delay_between_items_ms),
            retry: RetryPolicy {
                max_retries: pipeline.max_retries,
                timeout_max_retries: pipeline.timeout_max_retries,
                ordinary_delay: Duration::from_millis(pipeline.ordinary_retry_delay_ms),
                timeout_backoff_base: Duration::from_millis(pipeline.timeout_backoff_base_ms),
            },
            fetch: FetchTimings {
                navigation_timeout: Duration::from_millis(fetch.timeout_ms),
                direct_settle: Duration::from_millis(fetch.direct_settle_ms),
                render_settle: Duration::from_millis(fetch.render_settle_ms),
                selector_timeout: Duration::from_millis(fetch.selector_timeout_ms),
                content_selector: fetch.content_selector.clone(),
            },
            quality: QualityThresholds {
                extract_min: config.quality.extract_min_chars,
                save_min: config.quality.save_min_chars,
                floor: config.quality.minimal_floor_chars,
            },
        }
    }

    /// Settings for re-running a failure ledger: lenient gate, prior URL first
    pub fn resume(config: &Config) -> Self {
        let resume = &config.resume;

        Self {
            mode: QualityMode::Lenient,
            priority: StrategyPriority::PriorUrlFirst,
            concurrency: resume.concurrency as usize,
            item_delay: Duration::from_millis(resume.delay_between_items_ms),
            retry: RetryPolicy {
                max_retries: resume.max_retries,
                timeout_max_retries: resume.timeout_max_retries,
                ordinary_delay: Duration::from_millis(resume.ordinary_retry_delay_ms),
                timeout_backoff_base: Duration::from_millis(resume.timeout_backoff_base_ms),
            },
            fetch: FetchTimings {
                navigation_timeout: Duration::from_millis(resume.timeout_ms),
                direct_settle: Duration::from_millis(resume.direct_settle_ms),
                render_settle: Duration::from_millis(resume.render_settle_ms),
                selector_timeout: Duration::from_millis(resume.selector_timeout_ms),
                content_selector: resume.content_selector.clone(),
            },
            quality: QualityThresholds {
                extract_min: resume.extract_min_chars,
                save_min: resume.save_min_chars,
                floor: resume.minimal_floor_chars,
            },
        }
    }
}
