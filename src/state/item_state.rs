/// Work item state definitions for tracking an item through the processor
///
/// An item starts `Fresh`, moves through the strategy and quality-check states
/// once per attempt, and ends in exactly one terminal state.
use std::fmt;

/// Represents the current state of a work item inside the processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemState {
    // ===== Active States =====
    /// Item was popped from the queue and no attempt has started
    Fresh,

    /// Direct strategy is fetching the page
    TryingDirect,

    /// Rendered strategy is fetching the page
    TryingRendered,

    /// A strategy produced content and the quality gate is being applied
    QualityCheck,

    /// Attempt failed and the item is waiting out its backoff delay
    Retrying,

    // ===== Terminal States =====
    /// Content was written to disk
    Saved,

    /// Retry budget exhausted, a failure record was appended to the ledger
    Failed,

    /// Run was cancelled while the item was in flight; nothing is recorded
    Abandoned,
}

impl ItemState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Saved | Self::Failed | Self::Abandoned)
    }

    /// Returns true if this state represents a strategy fetch in progress
    pub fn is_fetching(&self) -> bool {
        matches!(self, Self::TryingDirect | Self::TryingRendered)
    }

    /// Checks whether the processor may move from `self` to `next`
    ///
    /// Any active state may be abandoned on cancellation. Otherwise an attempt
    /// always starts with a strategy, may fall back to the other strategy, and
    /// ends in the quality check, a retry, or a terminal failure.
    pub fn can_transition_to(&self, next: ItemState) -> bool {
        if self.is_terminal() {
            return false;
        }

        if next == Self::Abandoned {
            return true;
        }

        match self {
            Self::Fresh | Self::Retrying => next.is_fetching(),
            Self::TryingDirect => matches!(
                next,
                Self::TryingRendered | Self::QualityCheck | Self::Retrying | Self::Failed
            ),
            Self::TryingRendered => matches!(
                next,
                Self::TryingDirect | Self::QualityCheck | Self::Retrying | Self::Failed
            ),
            Self::QualityCheck => {
                matches!(next, Self::Saved | Self::Retrying | Self::Failed)
            }
            Self::Saved | Self::Failed | Self::Abandoned => false,
        }
    }

    /// Short lowercase name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::TryingDirect => "trying_direct",
            Self::TryingRendered => "trying_rendered",
            Self::QualityCheck => "quality_check",
            Self::Retrying => "retrying",
            Self::Saved => "saved",
            Self::Failed => "failed",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
