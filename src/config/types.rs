use serde::Deserialize;

/// Main configuration structure for doc-harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub quality: QualityConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub resume: ResumeConfig,
}

/// Where the documentation lives and which part of it to harvest
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Page whose links seed a fresh run
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Only site paths starting with this prefix are harvested
    #[serde(rename = "target-prefix")]
    pub target_prefix: String,

    /// Base URL for the direct strategy (`base-url + path`)
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Base URL for the rendered strategy (`dynamic-base-url + urlencode(path)`)
    #[serde(rename = "dynamic-base-url")]
    pub dynamic_base_url: String,
}

/// Page retrieval timings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Navigation timeout per request (milliseconds)
    pub timeout_ms: u64,

    /// Settle delay after a direct navigation (milliseconds)
    pub direct_settle_ms: u64,

    /// Settle delay after a rendered navigation (milliseconds)
    pub render_settle_ms: u64,

    /// Upper bound on waiting for the content region selector (milliseconds)
    pub selector_timeout_ms: u64,

    /// Settle delay after loading the start page during discovery (milliseconds)
    pub discovery_settle_ms: u64,

    /// Selector marking the rendered content region
    pub content_selector: String,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 15_000,
            direct_settle_ms: 1_000,
            render_settle_ms: 2_000,
            selector_timeout_ms: 5_000,
            discovery_settle_ms: 2_000,
            content_selector: r#"div[class*="content"], main, article, .markdown-body"#
                .to_string(),
            user_agent: format!("doc-harvest/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Worker pool and retry behaviour for the fresh pipeline
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PipelineConfig {
    /// Number of concurrent workers
    pub concurrency: u32,

    /// Delay each worker waits after finishing an item (milliseconds)
    pub delay_between_items_ms: u64,

    /// Retry budget for ordinary failures
    pub max_retries: u32,

    /// Retry budget once an item has timed out
    pub timeout_max_retries: u32,

    /// Fixed wait before retrying an ordinary failure (milliseconds)
    pub ordinary_retry_delay_ms: u64,

    /// Timeout retry `n` waits `n * timeout-backoff-base-ms`
    pub timeout_backoff_base_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: 20,
            delay_between_items_ms: 500,
            max_retries: 2,
            timeout_max_retries: 6,
            ordinary_retry_delay_ms: 1_000,
            timeout_backoff_base_ms: 2_000,
        }
    }
}

/// Content length thresholds (characters)
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct QualityConfig {
    /// Extracted text shorter than this counts as "no article"
    pub extract_min_chars: usize,

    /// Markdown at least this long is save-worthy
    pub save_min_chars: usize,

    /// Lenient runs still save (annotated) content at least this long
    pub minimal_floor_chars: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            extract_min_chars: 100,
            save_min_chars: 100,
            minimal_floor_chars: 10,
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Root directory for harvested Markdown files
    pub output_dir: String,

    /// Directory receiving failure ledgers and reports
    pub ledger_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: "docs".to_string(),
            ledger_dir: ".".to_string(),
        }
    }
}

/// Settings used instead of `[fetch]`, `[pipeline]` and `[quality]` when
/// re-running a failure ledger. The resume pass is slower and more patient.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ResumeConfig {
    pub concurrency: u32,
    pub delay_between_items_ms: u64,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub timeout_max_retries: u32,
    pub ordinary_retry_delay_ms: u64,
    pub timeout_backoff_base_ms: u64,
    pub direct_settle_ms: u64,
    pub render_settle_ms: u64,
    pub selector_timeout_ms: u64,
    pub content_selector: String,
    pub extract_min_chars: usize,
    pub save_min_chars: usize,
    pub minimal_floor_chars: usize,
}

impl Default for ResumeConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            delay_between_items_ms: 1_000,
            timeout_ms: 20_000,
            max_retries: 3,
            timeout_max_retries: 6,
            ordinary_retry_delay_ms: 2_000,
            timeout_backoff_base_ms: 3_000,
            direct_settle_ms: 2_000,
            render_settle_ms: 3_000,
            selector_timeout_ms: 8_000,
            content_selector:
                r#"div[class*="content"], main, article, .markdown-body, .dynamic-markdown-component"#
                    .to_string(),
            extract_min_chars: 10,
            save_min_chars: 50,
            minimal_floor_chars: 10,
        }
    }
}
