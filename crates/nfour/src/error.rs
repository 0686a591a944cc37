//! Error taxonomy (C13) for the duplex transport: peer closure, admission
//! overflow, request timeout and transport shutdown, grounded on the
//! source's package-level sentinel errors (`PeerCloseError`,
//! `ExceedConcurrentError`, `ErrTaskTimeout`, `ErrTransShutdown`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NFourError {
    /// The peer closed the connection (read hit EOF).
    #[error("peer closed")]
    PeerClosed,

    /// The idle-read deadline elapsed while waiting for the next frame
    /// header; the reader loop treats this as routine and keeps waiting.
    #[error("idle timeout waiting for next frame")]
    IdleTimeout,

    /// A frame header or body failed to arrive within the read deadline
    /// once a frame had already started; unlike `IdleTimeout` this is
    /// fatal, since a partially read frame cannot be resynchronized.
    #[error("read timeout mid-frame")]
    ReadTimeout,

    /// A response could not be written within the write deadline.
    #[error("write timeout")]
    WriteTimeout,

    /// The server's per-connection semaphore had no free slot within
    /// `SemaWaitTime`.
    #[error("exceed concurrent")]
    ExceedConcurrent,

    /// A client request did not receive a response within its read
    /// deadline.
    #[error("task execute timeout")]
    TaskTimeout,

    /// The transport (client) has been shut down and refuses new work.
    #[error("transport shut down")]
    TransShutdown,

    /// Any other I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl NFourError {
    /// True for conditions a caller may reasonably retry or route around
    /// (admission backpressure, a single request timing out, or the
    /// routine idle-header wait).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            NFourError::ExceedConcurrent | NFourError::TaskTimeout | NFourError::IdleTimeout
        )
    }

    /// True for conditions that end the connection or transport.
    pub fn is_terminal(&self) -> bool {
        !self.is_recoverable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_timeout_is_recoverable_not_terminal() {
        assert!(NFourError::IdleTimeout.is_recoverable());
        assert!(!NFourError::IdleTimeout.is_terminal());
    }

    #[test]
    fn admission_and_task_timeout_are_recoverable() {
        assert!(NFourError::ExceedConcurrent.is_recoverable());
        assert!(NFourError::TaskTimeout.is_recoverable());
    }

    #[test]
    fn mid_frame_and_shutdown_errors_are_terminal() {
        assert!(NFourError::ReadTimeout.is_terminal());
        assert!(NFourError::PeerClosed.is_terminal());
        assert!(NFourError::WriteTimeout.is_terminal());
        assert!(NFourError::TransShutdown.is_terminal());
        assert!(NFourError::Io(std::io::Error::other("boom")).is_terminal());
    }
}
