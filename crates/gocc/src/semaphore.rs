//! Counting semaphore (C2): two realizations of the same contract.
//!
//! `TokioSemaphore` wraps the runtime's native counting semaphore, which
//! already provides a correct, efficient timed acquire — the preferred
//! realization per the design notes. `AtomicSemaphore` is a direct port of
//! the source's CAS-loop fallback, kept only for parity with environments
//! that specifically want to avoid the channel/native path.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};

const ATOMIC_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Shared contract. `acquire_timeout(Duration::ZERO)` behaves as
/// `try_acquire`; negative durations have no direct representation in
/// `Duration`, so callers that want unconditional blocking should call
/// `acquire` directly.
pub trait Semaphore: Send + Sync {
    fn try_acquire(&self) -> bool;
    fn acquire(&self) -> impl std::future::Future<Output = ()> + Send;
    fn acquire_timeout(&self, d: Duration) -> impl std::future::Future<Output = bool> + Send;
    fn release(&self);
    fn total_tokens(&self) -> u32;
}

/// Native-semaphore-backed realization.
pub struct TokioSemaphore {
    inner: Arc<tokio::sync::Semaphore>,
    total: u32,
}

impl TokioSemaphore {
    pub fn new(total: u32) -> Self {
        Self {
            inner: Arc::new(tokio::sync::Semaphore::new(total as usize)),
            total,
        }
    }
}

impl Semaphore for TokioSemaphore {
    fn try_acquire(&self) -> bool {
        match self.inner.try_acquire() {
            Ok(permit) => {
                permit.forget();
                true
            }
            Err(_) => false,
        }
    }

    async fn acquire(&self) {
        if let Ok(permit) = self.inner.clone().acquire_owned().await {
            permit.forget();
        }
    }

    async fn acquire_timeout(&self, d: Duration) -> bool {
        if d.is_zero() {
            return self.try_acquire();
        }
        match tokio::time::timeout(d, self.inner.clone().acquire_owned()).await {
            Ok(Ok(permit)) => {
                permit.forget();
                true
            }
            _ => false,
        }
    }

    fn release(&self) {
        self.inner.add_permits(1);
    }

    fn total_tokens(&self) -> u32 {
        self.total
    }
}

/// Atomic-counter + sleep-poll fallback, ported from the source's
/// `atomicSemaphore.go`. Marked `unstable` there in favor of the
/// channel/native realization; kept here for the same reason.
pub struct AtomicSemaphore {
    limit: i64,
    counter: AtomicI64,
}

impl AtomicSemaphore {
    pub fn new(limit: u32) -> Self {
        Self {
            limit: i64::from(limit),
            counter: AtomicI64::new(0),
        }
    }
}

impl Semaphore for AtomicSemaphore {
    fn try_acquire(&self) -> bool {
        let c = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        if c <= self.limit {
            return true;
        }
        self.counter.fetch_sub(1, Ordering::SeqCst);
        false
    }

    async fn acquire(&self) {
        loop {
            if self.try_acquire() {
                return;
            }
            sleep(ATOMIC_POLL_INTERVAL).await;
        }
    }

    async fn acquire_timeout(&self, d: Duration) -> bool {
        if d.is_zero() {
            return self.try_acquire();
        }
        let deadline = Instant::now() + d;
        loop {
            if self.try_acquire() {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            sleep(remaining.min(ATOMIC_POLL_INTERVAL)).await;
        }
    }

    fn release(&self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }

    fn total_tokens(&self) -> u32 {
        self.limit as u32
    }
}

/// Default factory: the native-semaphore realization.
pub fn new_default_semaphore(total: u32) -> TokioSemaphore {
    TokioSemaphore::new(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn tokio_semaphore_respects_capacity() {
        let sem = TokioSemaphore::new(2);
        assert!(sem.try_acquire());
        assert!(sem.try_acquire());
        assert!(!sem.try_acquire());
        sem.release();
        assert!(sem.try_acquire());
    }

    #[tokio::test]
    async fn tokio_semaphore_acquire_timeout_expires() {
        let sem = TokioSemaphore::new(1);
        assert!(sem.try_acquire());
        let acquired = sem.acquire_timeout(Duration::from_millis(20)).await;
        assert!(!acquired);
    }

    #[tokio::test]
    async fn tokio_semaphore_acquire_timeout_succeeds_after_release() {
        let sem = Arc::new(TokioSemaphore::new(1));
        assert!(sem.try_acquire());
        let sem2 = sem.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            sem2.release();
        });
        assert!(sem.acquire_timeout(Duration::from_millis(200)).await);
    }

    #[tokio::test]
    async fn atomic_semaphore_respects_capacity() {
        let sem = AtomicSemaphore::new(1);
        assert!(sem.try_acquire());
        assert!(!sem.try_acquire());
        sem.release();
        assert!(sem.try_acquire());
    }

    #[tokio::test]
    async fn atomic_semaphore_timeout_expires() {
        let sem = AtomicSemaphore::new(0);
        let acquired = sem.acquire_timeout(Duration::from_millis(20)).await;
        assert!(!acquired);
    }
}
