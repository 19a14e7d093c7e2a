//! Per-item failure taxonomy and classification
//!
//! Every error a work item can hit is an [`ItemError`]. The processor never lets
//! one escape: it is classified into a [`FailureKind`] that selects the retry
//! budget and backoff schedule, and is eventually written to the ledger if the
//! budget runs out.

use crate::crawler::RenderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Backoff class of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// The page did not load in time; gets the larger budget and linear backoff
    #[serde(alias = "超时")]
    Timeout,
    /// Anything else; gets the smaller budget and a fixed delay
    #[default]
    #[serde(alias = "普通")]
    Ordinary,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Ordinary => "ordinary",
        }
    }

    /// Classifies a bare error message, as found in older ledgers
    pub fn from_message(message: &str) -> Self {
        if mentions_timeout(message) {
            Self::Timeout
        } else {
            Self::Ordinary
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can end a single attempt on a work item
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ItemError {
    /// The renderer gave up waiting for the page
    #[error("Navigation timeout for {url}: {message}")]
    FetchTimeout { url: String, message: String },

    /// Any other navigation or network fault
    #[error("Fetch failed for {url}: {message}")]
    FetchFailure { url: String, message: String },

    /// The page resolved to a missing-document state
    #[error("Page not found: {url}")]
    NotFound { url: String },

    /// Neither strategy produced a usable article
    #[error("No content extracted for {path}")]
    EmptyContent { path: String },

    /// An article was found but is too short to be worth saving
    #[error("Content too short for {path}: {length} < {threshold} chars")]
    ShortContent {
        path: String,
        length: usize,
        threshold: usize,
    },

    /// Writing the converted document failed
    #[error("Failed to write {path}: {message}")]
    Write { path: String, message: String },
}

impl ItemError {
    /// Classifies this error for backoff purposes
    ///
    /// A timeout reported by the renderer is always `Timeout`. Other fetch
    /// failures are `Timeout` too when their message mentions a timeout, since
    /// network stacks report timeouts in many shapes.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::FetchTimeout { .. } => FailureKind::Timeout,
            Self::FetchFailure { message, .. } if mentions_timeout(message) => {
                FailureKind::Timeout
            }
            _ => FailureKind::Ordinary,
        }
    }

    /// Converts a renderer error raised while loading `url`
    pub fn from_render(url: &str, err: RenderError) -> Self {
        match err {
            RenderError::Timeout { .. } => Self::FetchTimeout {
                url: url.to_string(),
                message: err.to_string(),
            },
            other => Self::FetchFailure {
                url: url.to_string(),
                message: other.to_string(),
            },
        }
    }
}

fn mentions_timeout(message: &str) -> bool {
    message.contains("timeout") || message.contains("Timeout")
}
