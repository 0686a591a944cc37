use thiserror::Error;

/// Errors surfaced by the concurrency primitives.
///
/// Category 7 of the error taxonomy (programming errors: group overflow,
/// over-release) is intentionally not represented here — those are
/// `panic!`s, matching the source's own fail-fast behavior.
#[derive(Debug, Error)]
pub enum GoccError {
    #[error("queue is full")]
    Full,
    #[error("queue is empty")]
    Empty,
    #[error("operation timed out")]
    Timeout,
    #[error("task was cancelled")]
    TaskCancelled,
}

impl GoccError {
    /// Whether the error reflects a transient, retryable condition rather
    /// than a fatal one. `Full`/`Empty`/`Timeout` are all total outcomes of
    /// otherwise-valid operations; `TaskCancelled` is a terminal outcome for
    /// the future it was reported on.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, GoccError::TaskCancelled)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_recoverable()
    }
}
