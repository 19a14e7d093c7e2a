//! Failure ledger
//!
//! Items that exhaust their retry budget are appended to a run-scoped
//! [`FailureLedger`]. At the end of the run the records are written as a JSON
//! ledger plus a plain-text report. A resume run loads a ledger as its seed
//! queue and writes a new, timestamped ledger of its own; the input is never
//! touched.

use crate::state::FailureKind;
use crate::storage::write_atomic;
use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Ledger file name written by a fresh run
pub const FRESH_LEDGER_FILE: &str = "failed_links.json";

/// Report file name written by a fresh run
pub const FRESH_REPORT_FILE: &str = "failed_links_report.txt";

/// Errors that can occur reading or writing a ledger
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid ledger {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// One item that ran out of retries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredRecord")]
pub struct FailureRecord {
    /// Site path of the item
    pub path: String,

    /// URL of the last strategy attempted
    pub last_used_url: String,

    /// Message of the error that ended the last attempt
    pub error_message: String,

    pub error_kind: FailureKind,

    /// Retries consumed before giving up
    pub retry_count: u32,

    pub timestamp: DateTime<Utc>,

    /// Error recorded by the run this item was resumed from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prior_error: Option<String>,
}

/// On-disk record as read, covering both this tool's ledgers and the
/// `newFailedLinks` entries of older retry ledgers
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecord {
    #[serde(alias = "linkPath")]
    path: String,
    #[serde(default)]
    last_used_url: String,
    #[serde(alias = "error")]
    error_message: String,
    #[serde(default, alias = "errorType")]
    error_kind: FailureKind,
    #[serde(default)]
    retry_count: u32,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    prior_error: Option<String>,
    #[serde(default)]
    retry_error: Option<String>,
    #[serde(default)]
    retry_attempts: Option<u32>,
    #[serde(default)]
    retry_timestamp: Option<DateTime<Utc>>,
}

impl From<StoredRecord> for FailureRecord {
    fn from(stored: StoredRecord) -> Self {
        let Some(retry_error) = stored.retry_error else {
            return Self {
                path: stored.path,
                last_used_url: stored.last_used_url,
                error_message: stored.error_message,
                error_kind: stored.error_kind,
                retry_count: stored.retry_count,
                timestamp: stored.timestamp,
                prior_error: stored.prior_error,
            };
        };

        // Older retry ledgers keep the first run's fields and add the retry
        // outcome alongside; the retry outcome is the current failure
        Self {
            path: stored.path,
            last_used_url: stored.last_used_url,
            error_kind: FailureKind::from_message(&retry_error),
            error_message: retry_error,
            retry_count: stored
                .retry_attempts
                .map_or(stored.retry_count, |attempts| attempts.saturating_sub(1)),
            timestamp: stored.retry_timestamp.unwrap_or(stored.timestamp),
            prior_error: stored.prior_error.or(Some(stored.error_message)),
        }
    }
}

/// Structured ledger file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerFile {
    pub timestamp: DateTime<Utc>,
    #[serde(default, alias = "newFailureCount")]
    pub total_failed: usize,
    #[serde(alias = "newFailedLinks")]
    pub failed_links: Vec<FailureRecord>,
}

impl LedgerFile {
    pub fn new(records: Vec<FailureRecord>, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            total_failed: records.len(),
            failed_links: records,
        }
    }

    /// Number of records of the given kind
    pub fn count_kind(&self, kind: FailureKind) -> usize {
        self.failed_links
            .iter()
            .filter(|r| r.error_kind == kind)
            .count()
    }
}

/// Run-scoped, concurrently appendable list of failure records
///
/// A path is recorded at most once per run; later records for the same path
/// are dropped.
#[derive(Debug, Default)]
pub struct FailureLedger {
    inner: Mutex<LedgerInner>,
}

#[derive(Debug, Default)]
struct LedgerInner {
    records: Vec<FailureRecord>,
    paths: HashSet<String>,
}

impl FailureLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record; returns false if the path was already recorded
    pub fn record(&self, record: FailureRecord) -> bool {
        let mut inner = self.lock();
        if !inner.paths.insert(record.path.clone()) {
            tracing::warn!(path = %record.path, "Duplicate failure record dropped");
            return false;
        }
        inner.records.push(record);
        true
    }

    /// Copy of the records in append order
    pub fn snapshot(&self) -> Vec<FailureRecord> {
        self.lock().records.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerInner> {
        // A panicked worker cannot leave the list half-updated
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Where a run's ledger and report go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerPaths {
    pub json: PathBuf,
    pub report: PathBuf,
}

impl LedgerPaths {
    /// `failed_links.json` and `failed_links_report.txt` in `dir`
    pub fn fresh(dir: &Path) -> Self {
        Self {
            json: dir.join(FRESH_LEDGER_FILE),
            report: dir.join(FRESH_REPORT_FILE),
        }
    }

    /// Timestamped resume ledger and report in `dir`
    ///
    /// The stamp is the UTC time to the second with `:` replaced by `-`, so
    /// `2024-05-01T12:30:05Z` gives `failed_links_retry_2024-05-01T12-30-05.json`.
    pub fn resume(dir: &Path, at: DateTime<Utc>) -> Self {
        let stamp = at.format("%Y-%m-%dT%H-%M-%S").to_string();
        Self {
            json: dir.join(format!("failed_links_retry_{}.json", stamp)),
            report: dir.join(format!("failed_links_retry_report_{}.txt", stamp)),
        }
    }
}

/// Writes the JSON ledger and the text report
///
/// # Arguments
///
/// * `paths` - Destination files
/// * `ledger` - The ledger to persist
///
/// # Returns
///
/// * `Ok(())` - Both files were written
/// * `Err(LedgerError)` - Serialization or writing failed
pub fn save_ledger(paths: &LedgerPaths, ledger: &LedgerFile) -> Result<(), LedgerError> {
    let json = serde_json::to_string_pretty(ledger).map_err(|source| LedgerError::Json {
        path: paths.json.clone(),
        source,
    })?;

    write_atomic(&paths.json, &json).map_err(|source| LedgerError::Io {
        path: paths.json.clone(),
        source,
    })?;

    write_atomic(&paths.report, &render_report(ledger)).map_err(|source| LedgerError::Io {
        path: paths.report.clone(),
        source,
    })?;

    tracing::info!(
        "Saved {} failure records to {} and {}",
        ledger.total_failed,
        paths.json.display(),
        paths.report.display()
    );
    Ok(())
}

/// Loads a ledger written by this tool or by its predecessor scripts
pub fn load_ledger(path: &Path) -> Result<LedgerFile, LedgerError> {
    let content = std::fs::read_to_string(path).map_err(|source| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut ledger: LedgerFile =
        serde_json::from_str(&content).map_err(|source| LedgerError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    // The count is derived; trust the records over a stale or missing total
    ledger.total_failed = ledger.failed_links.len();
    Ok(ledger)
}

/// Formats the human-readable failure report
pub fn render_report(ledger: &LedgerFile) -> String {
    let mut out = String::new();
    let rule = "=".repeat(50);

    let _ = writeln!(out, "Failed Links Report");
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Generated: {}", local_time(&ledger.timestamp));
    let _ = writeln!(out, "Total failed: {}", ledger.total_failed);
    let _ = writeln!(
        out,
        "  timeout: {}  ordinary: {}",
        ledger.count_kind(FailureKind::Timeout),
        ledger.count_kind(FailureKind::Ordinary)
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "Details:");
    let _ = writeln!(out, "{}", "-".repeat(30));

    for (index, record) in ledger.failed_links.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", index + 1, record.path);
        let _ = writeln!(out, "   URL:     {}", record.last_used_url);
        let _ = writeln!(out, "   Kind:    {}", record.error_kind);
        let _ = writeln!(out, "   Retries: {}", record.retry_count);
        let _ = writeln!(out, "   Error:   {}", record.error_message);
        if let Some(prior) = &record.prior_error {
            let _ = writeln!(out, "   Prior:   {}", prior);
        }
        let _ = writeln!(out, "   Time:    {}", local_time(&record.timestamp));
        let _ = writeln!(out);
    }

    out
}

fn local_time(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .to_rfc3339_opts(SecondsFormat::Secs, false)
}
