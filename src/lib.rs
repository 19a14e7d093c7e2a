//! doc-harvest: A resilient documentation harvester
//!
//! This crate fetches the pages of a documentation site through a bounded
//! worker pool, converts their main content to Markdown, and keeps a durable
//! failure ledger that a later resume run re-attempts.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for doc-harvest operations
///
/// Errors of individual work items never reach this type; they end in the
/// failure ledger instead.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Renderer error: {0}")]
    Render(#[from] crawler::RenderError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] storage::LedgerError),

    #[error("Link discovery failed: {0}")]
    Discovery(String),

    #[error("Worker error: {0}")]
    Worker(#[from] crawler::WorkerError),

    #[error("Run interrupted")]
    Interrupted,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Link points to another host: {0}")]
    ForeignHost(String),
}

/// Result type alias for doc-harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{FetchResult, Strategy};
pub use state::{FailureKind, ItemError, ItemState};
pub use storage::FailureRecord;
pub use url::SiteUrls;
