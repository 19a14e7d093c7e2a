//! Output module for harvested documents and run reporting
//!
//! This module handles:
//! - Writing harvested pages as Markdown documents
//! - Run statistics, progress lines and end-of-run summaries
//! - Inspecting a persisted failure ledger (`--stats`)

mod markdown;
pub mod stats;

pub use markdown::{render_document, DocumentNotes, DocumentWriter};
pub use stats::{format_summary, progress_line, RunKind, RunStatistics, StatsSnapshot};

use crate::state::FailureKind;
use crate::storage::LedgerFile;
use std::collections::HashMap;

/// Breakdown of a failure ledger
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerStatistics {
    /// Number of records in the ledger
    pub total: usize,

    /// Records classified as timeouts
    pub timeouts: usize,

    /// Records classified as ordinary failures
    pub ordinary: usize,

    /// Records per top-level site section, largest first
    pub by_section: Vec<(String, usize)>,

    /// Mean retries consumed per record
    pub mean_retries: f64,

    /// Records that were already failing in an earlier run
    pub repeat_failures: usize,
}

/// Computes the breakdown of a ledger
pub fn ledger_statistics(ledger: &LedgerFile) -> LedgerStatistics {
    let total = ledger.failed_links.len();

    let mut sections: HashMap<String, usize> = HashMap::new();
    for record in &ledger.failed_links {
        let section = record
            .path
            .trim_start_matches('/')
            .split('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("/")
            .to_string();
        *sections.entry(section).or_insert(0) += 1;
    }
    let mut by_section: Vec<_> = sections.into_iter().collect();
    by_section.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let retries: u64 = ledger
        .failed_links
        .iter()
        .map(|r| u64::from(r.retry_count))
        .sum();
    let mean_retries = if total > 0 {
        retries as f64 / total as f64
    } else {
        0.0
    };

    LedgerStatistics {
        total,
        timeouts: ledger.count_kind(FailureKind::Timeout),
        ordinary: ledger.count_kind(FailureKind::Ordinary),
        by_section,
        mean_retries,
        repeat_failures: ledger
            .failed_links
            .iter()
            .filter(|r| r.prior_error.is_some())
            .count(),
    }
}

/// Prints a ledger breakdown to stdout
pub fn print_ledger_statistics(ledger: &LedgerFile, stats: &LedgerStatistics) {
    println!("=== Failure Ledger ===\n");

    println!("Written: {}", ledger.timestamp.to_rfc3339());
    println!("Total failed: {}", stats.total);
    println!("  timeout: {}", stats.timeouts);
    println!("  ordinary: {}", stats.ordinary);
    println!("Mean retries per item: {:.1}", stats.mean_retries);
    if stats.repeat_failures > 0 {
        println!("Failing again after a resume: {}", stats.repeat_failures);
    }
    println!();

    if !stats.by_section.is_empty() {
        println!("By section:");
        for (section, count) in &stats.by_section {
            println!("  {}: {}", section, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FailureRecord;
    use chrono::Utc;

    fn record(path: &str, kind: FailureKind, retries: u32, prior: bool) -> FailureRecord {
        FailureRecord {
            path: path.to_string(),
            last_used_url: String::new(),
            error_message: "failed".to_string(),
            error_kind: kind,
            retry_count: retries,
            timestamp: Utc::now(),
            prior_error: prior.then(|| "earlier".to_string()),
        }
    }

    #[test]
    fn test_ledger_statistics() {
        let ledger = LedgerFile::new(
            vec![
                record("/guide/a.html", FailureKind::Timeout, 6, false),
                record("/guide/b.html", FailureKind::Ordinary, 2, true),
                record("/api/c.html", FailureKind::Ordinary, 1, false),
            ],
            Utc::now(),
        );

        let stats = ledger_statistics(&ledger);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.timeouts, 1);
        assert_eq!(stats.ordinary, 2);
        assert_eq!(stats.repeat_failures, 1);
        assert_eq!(stats.by_section[0], ("guide".to_string(), 2));
        assert_eq!(stats.by_section[1], ("api".to_string(), 1));
        assert!((stats.mean_retries - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_ledger_statistics() {
        let stats = ledger_statistics(&LedgerFile::new(vec![], Utc::now()));
        assert_eq!(stats.total, 0);
        assert_eq!(stats.mean_retries, 0.0);
        assert!(stats.by_section.is_empty());
    }
}
