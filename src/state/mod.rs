mod failure;
mod item_state;
mod retry;

pub use failure::{FailureKind, ItemError};
pub use item_state::ItemState;
pub use retry::{RetryBudget, RetryDecision, RetryPolicy};
