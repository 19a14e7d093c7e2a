//! Run statistics
//!
//! Counters are shared by every worker of a run and updated with atomic
//! increments. A [`StatsSnapshot`] is taken for progress lines and for the
//! final summary.

use crate::crawler::Strategy;
use crate::state::FailureKind;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Concurrently updated counters for one run
#[derive(Debug)]
pub struct RunStatistics {
    total: AtomicUsize,
    direct_successes: AtomicUsize,
    rendered_successes: AtomicUsize,
    suspicious_saves: AtomicUsize,
    timeout_failures: AtomicUsize,
    ordinary_failures: AtomicUsize,
    timeout_retries: AtomicUsize,
    ordinary_retries: AtomicUsize,
    attempts: AtomicUsize,
    started: Instant,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self {
            total: AtomicUsize::new(0),
            direct_successes: AtomicUsize::new(0),
            rendered_successes: AtomicUsize::new(0),
            suspicious_saves: AtomicUsize::new(0),
            timeout_failures: AtomicUsize::new(0),
            ordinary_failures: AtomicUsize::new(0),
            timeout_retries: AtomicUsize::new(0),
            ordinary_retries: AtomicUsize::new(0),
            attempts: AtomicUsize::new(0),
            started: Instant::now(),
        }
    }

    /// Sets the number of items seeded into the queue
    pub fn set_total(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
    }

    pub fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a saved item; returns the number of completed items including it
    pub fn record_success(&self, strategy: Strategy, suspicious: bool) -> usize {
        if suspicious {
            self.suspicious_saves.fetch_add(1, Ordering::Relaxed);
        }
        match strategy {
            Strategy::Direct => self.direct_successes.fetch_add(1, Ordering::Relaxed),
            Strategy::Rendered => self.rendered_successes.fetch_add(1, Ordering::Relaxed),
        };
        self.completed()
    }

    /// Records an item that ran out of retries; returns the completed count
    pub fn record_failure(&self, kind: FailureKind) -> usize {
        match kind {
            FailureKind::Timeout => self.timeout_failures.fetch_add(1, Ordering::Relaxed),
            FailureKind::Ordinary => self.ordinary_failures.fetch_add(1, Ordering::Relaxed),
        };
        self.completed()
    }

    pub fn record_retry(&self, kind: FailureKind) {
        match kind {
            FailureKind::Timeout => self.timeout_retries.fetch_add(1, Ordering::Relaxed),
            FailureKind::Ordinary => self.ordinary_retries.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Items that reached a terminal outcome
    pub fn completed(&self) -> usize {
        self.direct_successes.load(Ordering::Relaxed)
            + self.rendered_successes.load(Ordering::Relaxed)
            + self.timeout_failures.load(Ordering::Relaxed)
            + self.ordinary_failures.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total: self.total(),
            direct_successes: self.direct_successes.load(Ordering::Relaxed),
            rendered_successes: self.rendered_successes.load(Ordering::Relaxed),
            suspicious_saves: self.suspicious_saves.load(Ordering::Relaxed),
            timeout_failures: self.timeout_failures.load(Ordering::Relaxed),
            ordinary_failures: self.ordinary_failures.load(Ordering::Relaxed),
            timeout_retries: self.timeout_retries.load(Ordering::Relaxed),
            ordinary_retries: self.ordinary_retries.load(Ordering::Relaxed),
            attempts: self.attempts.load(Ordering::Relaxed),
            elapsed: self.started.elapsed(),
        }
    }
}

impl Default for RunStatistics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the run counters
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub total: usize,
    pub direct_successes: usize,
    pub rendered_successes: usize,
    pub suspicious_saves: usize,
    pub timeout_failures: usize,
    pub ordinary_failures: usize,
    pub timeout_retries: usize,
    pub ordinary_retries: usize,
    pub attempts: usize,
    pub elapsed: Duration,
}

impl StatsSnapshot {
    pub fn successes(&self) -> usize {
        self.direct_successes + self.rendered_successes
    }

    pub fn failures(&self) -> usize {
        self.timeout_failures + self.ordinary_failures
    }

    pub fn completed(&self) -> usize {
        self.successes() + self.failures()
    }

    /// Items per second over the whole run
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.completed() as f64 / secs
        } else {
            0.0
        }
    }
}

/// Which summary flavour to print
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Fresh,
    Resume,
}

/// Formats `done/total (pct%)`
pub fn progress_line(done: usize, total: usize) -> String {
    format!("{}/{} ({:.1}%)", done, total, percentage(done, total))
}

fn percentage(part: usize, total: usize) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Formats the end-of-run summary
///
/// # Arguments
///
/// * `stats` - Final counters
/// * `kind` - Fresh or resume run
/// * `report` - Report written for the remaining failures, if any
/// * `interrupted` - Whether the run was cancelled before the queue drained
pub fn format_summary(
    stats: &StatsSnapshot,
    kind: RunKind,
    report: Option<&Path>,
    interrupted: bool,
) -> String {
    let rule = "=".repeat(60);
    let mut lines = Vec::new();

    lines.push(rule.clone());
    lines.push(match kind {
        RunKind::Fresh => "Harvest Summary".to_string(),
        RunKind::Resume => "Resume Summary".to_string(),
    });
    lines.push(rule.clone());

    if interrupted {
        lines.push(format!(
            "Interrupted: {} of {} items finished before cancellation",
            stats.completed(),
            stats.total
        ));
    }

    let secs = stats.elapsed.as_secs();
    lines.push(format!("Duration: {}m {}s", secs / 60, secs % 60));
    lines.push(format!("Total items: {}", stats.total));

    match kind {
        RunKind::Fresh => {
            lines.push(format!(
                "Succeeded: {} ({:.1}%)",
                stats.successes(),
                percentage(stats.successes(), stats.total)
            ));
            lines.push(format!(
                "Failed: {} ({:.1}%)",
                stats.failures(),
                percentage(stats.failures(), stats.total)
            ));
        }
        RunKind::Resume => {
            lines.push(format!(
                "Rescued: {} ({:.1}%)",
                stats.successes(),
                percentage(stats.successes(), stats.total)
            ));
            lines.push(format!(
                "Still failing: {} ({:.1}%)",
                stats.failures(),
                percentage(stats.failures(), stats.total)
            ));
        }
    }

    lines.push(format!("  via direct: {}", stats.direct_successes));
    lines.push(format!("  via rendered: {}", stats.rendered_successes));
    if stats.suspicious_saves > 0 {
        lines.push(format!(
            "  saved with short-content warning: {}",
            stats.suspicious_saves
        ));
    }
    lines.push(format!("Timeout retries: {}", stats.timeout_retries));
    lines.push(format!("Ordinary retries: {}", stats.ordinary_retries));
    lines.push(format!("Attempts: {}", stats.attempts));
    lines.push(format!("Throughput: {:.2} items/s", stats.throughput()));

    if stats.failures() > 0 {
        lines.push(String::new());
        lines.push("Failures by kind:".to_string());
        lines.push(format!("  timeout: {}", stats.timeout_failures));
        lines.push(format!("  ordinary: {}", stats.ordinary_failures));
        if let Some(report) = report {
            lines.push(format!("  report: {}", report.display()));
        }
    }

    lines.push(rule);
    lines.join("\n")
}
