//! Future / FutureGroup (C4): one-shot result cell with cancellation, and
//! a fixed-size barrier over a set of such cells.
//!
//! Grounded on the source's `future.go`. The "single writer, many readers"
//! completion discipline described in the design notes is modeled here with
//! an `AtomicBool` compare-exchange guarding the one write to the result
//! slot; readers observe completion through a `Notify` and read the slot
//! under a plain mutex once they know it has been written.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;

use crate::error::GoccError;
use crate::latch::CountdownLatch;

/// A one-shot result cell. `T` is required to be `Clone` so that `get()`
/// (and a group's exposure of member results) can be called more than
/// once without consuming the stored value, matching the source's
/// `atomic.Pointer`-backed read-many semantics.
pub struct Future<T: Clone + Send + 'static> {
    slot: Mutex<Option<Result<T, GoccError>>>,
    completed: AtomicBool,
    cancelled: AtomicBool,
    ready: Notify,
    group_latch: Option<Arc<CountdownLatch>>,
}

impl<T: Clone + Send + 'static> Future<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            slot: Mutex::new(None),
            completed: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            ready: Notify::new(),
            group_latch: None,
        })
    }

    pub(crate) fn with_group(latch: Arc<CountdownLatch>) -> Arc<Self> {
        Arc::new(Self {
            slot: Mutex::new(None),
            completed: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            ready: Notify::new(),
            group_latch: Some(latch),
        })
    }

    /// Idempotent: setting the flag more than once has no additional
    /// effect. Advisory before the task starts; a hint only afterwards.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Writes the result exactly once. Returns `false` if another accept
    /// already won the race (the caller's result is discarded).
    pub fn accept(&self, result: Result<T, GoccError>) -> bool {
        if self
            .completed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }
        *self.slot.lock().unwrap() = Some(result);
        self.ready.notify_waiters();
        if let Some(latch) = &self.group_latch {
            latch.down();
        }
        true
    }

    fn read_slot(&self) -> Result<T, GoccError> {
        self.slot
            .lock()
            .unwrap()
            .clone()
            .expect("slot populated before completed flag is observed")
    }

    /// Blocks until completed.
    pub async fn get(&self) -> Result<T, GoccError> {
        if self.completed.load(Ordering::SeqCst) {
            return self.read_slot();
        }
        let notified = self.ready.notified();
        if self.completed.load(Ordering::SeqCst) {
            return self.read_slot();
        }
        notified.await;
        self.read_slot()
    }

    /// Non-blocking: `Timeout` if still pending.
    pub fn try_get(&self) -> Result<T, GoccError> {
        if self.completed.load(Ordering::SeqCst) {
            self.read_slot()
        } else {
            Err(GoccError::Timeout)
        }
    }

    /// `d == 0` behaves as `try_get`; otherwise races `get` against a
    /// timer. Callers wanting unconditional blocking should call `get`
    /// directly.
    pub async fn get_timeout(&self, d: Duration) -> Result<T, GoccError> {
        if d.is_zero() {
            return self.try_get();
        }
        match tokio::time::timeout(d, self.get()).await {
            Ok(r) => r,
            Err(_) => Err(GoccError::Timeout),
        }
    }
}

/// A `CountdownLatch(size)` plus an append-only member list. Appends are
/// not safe to race with each other or with `cancel()` — the source's own
/// contract requires they happen on the creating task, before or alongside
/// `execute_in_group` calls.
pub struct FutureGroup<T: Clone + Send + 'static> {
    size: usize,
    latch: Arc<CountdownLatch>,
    members: Mutex<Vec<Arc<Future<T>>>>,
}

impl<T: Clone + Send + 'static> FutureGroup<T> {
    pub fn new(size: usize) -> Arc<Self> {
        Arc::new(Self {
            size,
            latch: Arc::new(CountdownLatch::new(size as i64)),
            members: Mutex::new(Vec::with_capacity(size)),
        })
    }

    pub(crate) fn latch(&self) -> Arc<CountdownLatch> {
        self.latch.clone()
    }

    /// Appends a member. Panics ("exceed group size") if this would grow
    /// the list past `size` — a programming error, not a runtime
    /// condition callers are expected to recover from.
    pub(crate) fn add(&self, future: Arc<Future<T>>) {
        let mut members = self.members.lock().unwrap();
        assert!(members.len() < self.size, "exceed group size");
        members.push(future);
    }

    fn check(&self) {
        let len = self.members.lock().unwrap().len();
        assert!(
            len == self.size,
            "future not enough: group of size {} has {len} members",
            self.size
        );
    }

    pub async fn wait(&self) {
        self.check();
        self.latch.wait().await;
    }

    pub fn try_wait(&self) -> bool {
        self.check();
        self.latch.try_wait()
    }

    pub async fn wait_timeout(&self, d: Duration) -> bool {
        self.check();
        self.latch.wait_timeout(d).await
    }

    /// Sets the cancel flag on every current member. Not synchronized with
    /// concurrent `execute_in_group` calls on the same group.
    pub fn cancel(&self) {
        for member in self.members.lock().unwrap().iter() {
            member.cancel();
        }
    }

    pub fn members(&self) -> Vec<Arc<Future<T>>> {
        self.members.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completes_once() {
        let f: Arc<Future<i32>> = Future::new();
        assert!(f.accept(Ok(42)));
        assert!(!f.accept(Ok(7)));
        assert_eq!(f.get().await.unwrap(), 42);
        assert_eq!(f.try_get().unwrap(), 42);
    }

    #[tokio::test]
    async fn try_get_pending_is_timeout() {
        let f: Arc<Future<i32>> = Future::new();
        assert!(matches!(f.try_get(), Err(GoccError::Timeout)));
    }

    #[tokio::test]
    async fn cancel_is_idempotent_and_advisory() {
        let f: Arc<Future<i32>> = Future::new();
        f.cancel();
        f.cancel();
        assert!(f.is_cancelled());
        // Cancellation observed before the task runs: the runner is
        // responsible for reporting TaskCancelled; this cell itself only
        // tracks the flag.
        assert!(f.accept(Err(GoccError::TaskCancelled)));
        assert!(matches!(f.get().await, Err(GoccError::TaskCancelled)));
    }

    #[tokio::test]
    async fn group_of_zero_like_size_requires_exact_membership() {
        let g: Arc<FutureGroup<i32>> = FutureGroup::new(1);
        let f = Future::with_group(g.latch());
        g.add(f.clone());
        f.accept(Ok(325));
        g.wait().await;
        assert!(g.try_wait());
    }

    #[tokio::test]
    #[should_panic(expected = "future not enough")]
    async fn wait_before_full_membership_panics() {
        let g: Arc<FutureGroup<i32>> = FutureGroup::new(2);
        let f = Future::with_group(g.latch());
        g.add(f);
        g.wait().await;
    }

    #[tokio::test]
    #[should_panic(expected = "exceed group size")]
    async fn oversized_append_panics() {
        let g: Arc<FutureGroup<i32>> = FutureGroup::new(1);
        g.add(Future::with_group(g.latch()));
        g.add(Future::with_group(g.latch()));
    }
}
