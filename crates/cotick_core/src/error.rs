//! Coroutine error types

use thiserror::Error;

/// Errors raised while resuming a coroutine.
///
/// The scheduler does not isolate these: the first failure aborts the current
/// tick pass and is handed back to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoroutineError {
    /// A user coroutine gave up
    #[error("Coroutine failed: {0}")]
    Failed(String),

    /// The value an animation writes to was already borrowed elsewhere
    #[error("Animation target is already borrowed")]
    TargetBorrowed,

    /// `tick` was called while a tick pass was already running
    #[error("Scheduler is already ticking")]
    ReentrantTick,
}

impl CoroutineError {
    /// Shorthand for [`CoroutineError::Failed`]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}

/// Result type for coroutine operations
pub type Result<T> = std::result::Result<T, CoroutineError>;
