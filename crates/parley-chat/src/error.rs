use thiserror::Error;

use parley_persist::StoreError;

/// Failure taxonomy for the send pipeline
///
/// Validation and authorization never reach the agent or the store. A store
/// failure on the user turn aborts the send; store failures after streaming
/// downgrade to a `was_saved = false` flag instead. Agent failures always
/// resolve to a terminal chunk, never a crash. Cancellation is a clean
/// terminal state, not a failure.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),

    /// Ownership mismatch and absence are deliberately indistinguishable
    #[error("not found or access denied")]
    AccessDenied,

    #[error("storage failure: {0}")]
    Store(#[from] StoreError),

    #[error("agent failure: {0}")]
    Agent(String),

    #[error("operation cancelled")]
    Cancelled,
}
