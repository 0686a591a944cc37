//! Completion latch (C3): counter + one-shot broadcast.
//!
//! Grounded on the source's `CountdownLatch`: an atomic signed counter plus
//! a channel that is closed exactly once, when the counter transitions to
//! zero. `Notify` plays the role of that close-once channel here, matching
//! the idempotent-broadcast pattern the teacher uses for shutdown signals.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use tokio::sync::Notify;

pub struct CountdownLatch {
    count: AtomicI64,
    fired: AtomicBool,
    notify: Notify,
}

impl CountdownLatch {
    pub fn new(count: i64) -> Self {
        assert!(count >= 0, "invalid count value");
        let latch = Self {
            count: AtomicI64::new(count),
            fired: AtomicBool::new(false),
            notify: Notify::new(),
        };
        if count == 0 {
            latch.fire();
        }
        latch
    }

    fn fire(&self) {
        if self
            .fired
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.notify.notify_waiters();
        }
    }

    /// Decrements the counter; floors at zero. Returns the value after
    /// decrementing (never negative).
    pub fn down(&self) -> i64 {
        let prev = self.count.fetch_sub(1, Ordering::SeqCst);
        if prev == 1 {
            self.fire();
            return 0;
        }
        if prev <= 0 {
            // Already at the floor; undo the spurious decrement.
            self.count.fetch_add(1, Ordering::SeqCst);
            return 0;
        }
        prev - 1
    }

    pub fn try_wait(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    pub async fn wait(&self) {
        if self.try_wait() {
            return;
        }
        // Notify::notify_waiters only reaches tasks already registered as
        // waiters, so register before re-checking to avoid the race where
        // `fire` runs between our check and our subscription.
        let notified = self.notify.notified();
        if self.try_wait() {
            return;
        }
        notified.await;
    }

    pub async fn wait_timeout(&self, d: std::time::Duration) -> bool {
        if self.try_wait() {
            return true;
        }
        tokio::time::timeout(d, self.wait()).await.is_ok() || self.try_wait()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn fires_at_zero() {
        let latch = CountdownLatch::new(3);
        assert!(!latch.try_wait());
        latch.down();
        latch.down();
        assert!(!latch.try_wait());
        latch.down();
        assert!(latch.try_wait());
        latch.wait().await;
    }

    #[tokio::test]
    async fn zero_is_already_fired() {
        let latch = CountdownLatch::new(0);
        assert!(latch.try_wait());
        latch.wait().await;
    }

    #[tokio::test]
    async fn floors_at_zero() {
        let latch = CountdownLatch::new(1);
        assert_eq!(latch.down(), 0);
        assert_eq!(latch.down(), 0);
        assert!(latch.try_wait());
    }

    #[tokio::test]
    async fn waiters_observe_concurrent_fire() {
        let latch = Arc::new(CountdownLatch::new(1));
        let l2 = latch.clone();
        let waiter = tokio::spawn(async move {
            l2.wait().await;
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        latch.down();
        waiter.await.unwrap();
    }
}
