//! Retry budgets and backoff schedules
//!
//! A [`RetryPolicy`] is shared by every item of a run. Each item owns a
//! [`RetryBudget`] built from it, which records failures and decides whether
//! the item gets another attempt.
//!
//! ```
//! use doc_harvest::state::{FailureKind, RetryDecision, RetryPolicy};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy {
//!     max_retries: 2,
//!     timeout_max_retries: 6,
//!     ordinary_delay: Duration::from_secs(1),
//!     timeout_backoff_base: Duration::from_secs(2),
//! };
//! let mut budget = policy.budget();
//!
//! // A timeout escalates the item to the larger budget
//! assert_eq!(
//!     budget.record_failure(FailureKind::Timeout),
//!     RetryDecision::Retry { delay: Duration::from_secs(2), retry: 1 }
//! );
//! assert_eq!(budget.max_retries(), 6);
//! ```

use super::FailureKind;
use std::time::Duration;

/// Budgets and delays for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed while an item has only seen ordinary failures
    pub max_retries: u32,
    /// Retries allowed once an item has timed out
    pub timeout_max_retries: u32,
    /// Fixed wait before an ordinary retry
    pub ordinary_delay: Duration,
    /// Timeout retry `n` waits `n * timeout_backoff_base`
    pub timeout_backoff_base: Duration,
}

impl RetryPolicy {
    /// Starts a fresh budget for a new work item
    pub fn budget(&self) -> RetryBudget {
        RetryBudget {
            policy: self.clone(),
            max_retries: self.max_retries,
            used: 0,
        }
    }

    /// Budget that applies to a failure of the given kind
    pub fn budget_for(&self, kind: FailureKind) -> u32 {
        match kind {
            FailureKind::Timeout => self.timeout_max_retries,
            FailureKind::Ordinary => self.max_retries,
        }
    }

    /// Wait before retry number `retry` (1-indexed)
    pub fn delay_for(&self, kind: FailureKind, retry: u32) -> Duration {
        match kind {
            FailureKind::Timeout => self.timeout_backoff_base.saturating_mul(retry),
            FailureKind::Ordinary => self.ordinary_delay,
        }
    }
}

/// What the processor should do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait `delay` and run retry number `retry`
    Retry { delay: Duration, retry: u32 },
    /// Budget is exhausted after `retries` retries
    GiveUp { retries: u32 },
}

/// Retry accounting for a single work item
#[derive(Debug, Clone)]
pub struct RetryBudget {
    policy: RetryPolicy,
    max_retries: u32,
    used: u32,
}

impl RetryBudget {
    /// Records a failed attempt and decides whether to retry
    ///
    /// The budget only ever grows: a timeout raises it to the timeout budget
    /// and a later ordinary failure does not lower it again.
    pub fn record_failure(&mut self, kind: FailureKind) -> RetryDecision {
        self.max_retries = self.max_retries.max(self.policy.budget_for(kind));

        if self.used < self.max_retries {
            self.used += 1;
            RetryDecision::Retry {
                delay: self.policy.delay_for(kind, self.used),
                retry: self.used,
            }
        } else {
            RetryDecision::GiveUp { retries: self.used }
        }
    }

    /// Retries consumed so far
    pub fn used(&self) -> u32 {
        self.used
    }

    /// Current budget for this item
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Retries still available
    pub fn remaining(&self) -> u32 {
        self.max_retries - self.used
    }
}
