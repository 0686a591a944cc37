//! Bounded blocking queue (C1): two realizations of the same contract.
//!
//! The ring-buffer realization mirrors the source's `arrayBlockingQueue`:
//! a single mutex guarding `wi`/`ri` counters plus a read-condition and a
//! write-condition, signalled on every successful mutation. The channel
//! realization mirrors `chanBlockingQueue`, wrapping a native bounded
//! channel. The channel realization intentionally does not expose blocking
//! (infinite-wait) offer/pull — see `RingBlockingQueue` for that pair.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::{timeout, Instant};

use crate::config::QueueConfig;
use crate::error::GoccError;

/// Shared contract for both realizations. `try_offer`/`try_pull` are
/// synchronous and total; the `_timeout` variants are async and race the
/// operation against a timer, re-checking the predicate on every wake to
/// tolerate spurious notifications.
pub trait BoundedQueue<T>: Send + Sync {
    /// Non-blocking write; fails with `Full` at capacity.
    fn try_offer(&self, value: T) -> Result<(), GoccError>;

    /// Non-blocking read; fails with `Empty` when empty.
    fn try_pull(&self) -> Result<T, GoccError>;

    /// Waits up to `timeout` for capacity, re-checking on spurious wakes.
    fn offer_timeout(
        &self,
        value: T,
        timeout: Duration,
    ) -> impl std::future::Future<Output = Result<(), GoccError>> + Send;

    /// Dual of `offer_timeout`.
    fn pull_timeout(
        &self,
        timeout: Duration,
    ) -> impl std::future::Future<Output = Result<T, GoccError>> + Send;
}

/// Ring-buffer realization: `buf[capacity]` guarded by a single mutex, with
/// a read-condition and write-condition modeled as `Notify` handles (the
/// async equivalent of the source's `sync.Cond`-style `SyncCondition`).
/// This is the only realization that supports unbounded blocking
/// offer/pull, matching the source's "default factory picks ring-buffer
/// when blocking is required" contract.
pub struct RingBlockingQueue<T> {
    inner: Mutex<VecDeque<T>>,
    capacity: usize,
    not_full: Notify,
    not_empty: Notify,
}

impl<T: Send> RingBlockingQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            not_full: Notify::new(),
            not_empty: Notify::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Waits indefinitely for capacity.
    pub async fn offer_blocking(&self, mut value: T) {
        loop {
            {
                let mut guard = self.inner.lock().unwrap();
                if guard.len() < self.capacity {
                    guard.push_back(value);
                    self.not_empty.notify_one();
                    return;
                }
            }
            value = self.wait_not_full(value).await;
        }
    }

    /// Waits indefinitely for an element.
    pub async fn pull_blocking(&self) -> T {
        loop {
            {
                let mut guard = self.inner.lock().unwrap();
                if let Some(v) = guard.pop_front() {
                    self.not_full.notify_one();
                    return v;
                }
            }
            self.not_empty.notified().await;
        }
    }

    async fn wait_not_full(&self, value: T) -> T {
        self.not_full.notified().await;
        value
    }
}

impl<T: Send + Sync> BoundedQueue<T> for RingBlockingQueue<T> {
    fn try_offer(&self, value: T) -> Result<(), GoccError> {
        let mut guard = self.inner.lock().unwrap();
        if guard.len() >= self.capacity {
            return Err(GoccError::Full);
        }
        guard.push_back(value);
        drop(guard);
        self.not_empty.notify_one();
        Ok(())
    }

    fn try_pull(&self) -> Result<T, GoccError> {
        let mut guard = self.inner.lock().unwrap();
        match guard.pop_front() {
            Some(v) => {
                drop(guard);
                self.not_full.notify_one();
                Ok(v)
            }
            None => Err(GoccError::Empty),
        }
    }

    async fn offer_timeout(&self, value: T, wait: Duration) -> Result<(), GoccError> {
        let deadline = Instant::now() + wait;
        let mut slot = Some(value);
        loop {
            {
                let mut guard = self.inner.lock().unwrap();
                if guard.len() < self.capacity {
                    guard.push_back(slot.take().expect("value present until enqueued"));
                    drop(guard);
                    self.not_empty.notify_one();
                    return Ok(());
                }
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(GoccError::Full);
            }
            if timeout(remaining, self.not_full.notified()).await.is_err() {
                return Err(GoccError::Full);
            }
        }
    }

    async fn pull_timeout(&self, wait: Duration) -> Result<T, GoccError> {
        let deadline = Instant::now() + wait;
        loop {
            match self.try_pull() {
                Ok(v) => return Ok(v),
                Err(GoccError::Empty) => {}
                Err(e) => return Err(e),
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(GoccError::Empty);
            }
            if timeout(remaining, self.not_empty.notified()).await.is_err() {
                return Err(GoccError::Empty);
            }
        }
    }
}

/// Channel realization: a fixed-capacity FIFO native to the runtime.
/// Does not expose `offer_blocking`/`pull_blocking` — callers that need
/// unbounded waiting should use `RingBlockingQueue`.
pub struct ChanBlockingQueue<T> {
    tx: tokio::sync::mpsc::Sender<T>,
    rx: tokio::sync::Mutex<tokio::sync::mpsc::Receiver<T>>,
    capacity: usize,
}

impl<T: Send> ChanBlockingQueue<T> {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = tokio::sync::mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx: tokio::sync::Mutex::new(rx),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: Send + Sync> BoundedQueue<T> for ChanBlockingQueue<T> {
    fn try_offer(&self, value: T) -> Result<(), GoccError> {
        self.tx.try_send(value).map_err(|_| GoccError::Full)
    }

    fn try_pull(&self) -> Result<T, GoccError> {
        self.rx
            .try_lock()
            .map_err(|_| GoccError::Empty)?
            .try_recv()
            .map_err(|_| GoccError::Empty)
    }

    async fn offer_timeout(&self, value: T, wait: Duration) -> Result<(), GoccError> {
        match timeout(wait, self.tx.send(value)).await {
            Ok(Ok(())) => Ok(()),
            _ => Err(GoccError::Full),
        }
    }

    async fn pull_timeout(&self, wait: Duration) -> Result<T, GoccError> {
        let mut rx = self.rx.lock().await;
        match timeout(wait, rx.recv()).await {
            Ok(Some(v)) => Ok(v),
            _ => Err(GoccError::Empty),
        }
    }
}

/// Default factory: the ring-buffer realization, matching the source's
/// stated preference ("the default factory should pick the ring-buffer
/// realization when blocking is required").
pub fn new_default_queue<T: Send + Sync>(capacity: usize) -> RingBlockingQueue<T> {
    RingBlockingQueue::new(capacity)
}

/// Same default factory, sized from a `QueueConfig` rather than a bare
/// capacity.
pub fn new_default_queue_from_config<T: Send + Sync>(cfg: QueueConfig) -> RingBlockingQueue<T> {
    RingBlockingQueue::new(cfg.capacity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn ring_try_offer_respects_capacity() {
        let q: RingBlockingQueue<i32> = RingBlockingQueue::new(2);
        assert!(q.try_offer(1).is_ok());
        assert!(q.try_offer(2).is_ok());
        assert!(matches!(q.try_offer(3), Err(GoccError::Full)));
        assert_eq!(q.try_pull().unwrap(), 1);
        assert!(q.try_offer(3).is_ok());
    }

    #[test]
    fn ring_try_pull_empty() {
        let q: RingBlockingQueue<i32> = RingBlockingQueue::new(2);
        assert!(matches!(q.try_pull(), Err(GoccError::Empty)));
    }

    #[tokio::test]
    async fn ring_offer_timeout_unblocks_on_consumer() {
        let q = Arc::new(RingBlockingQueue::<i32>::new(1));
        q.try_offer(1).unwrap();
        let q2 = q.clone();
        let consumer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            q2.try_pull().unwrap()
        });
        let res = q.offer_timeout(2, Duration::from_millis(200)).await;
        assert!(res.is_ok());
        assert_eq!(consumer.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn ring_offer_timeout_expires() {
        let q: RingBlockingQueue<i32> = RingBlockingQueue::new(1);
        q.try_offer(1).unwrap();
        let res = q.offer_timeout(2, Duration::from_millis(20)).await;
        assert!(matches!(res, Err(GoccError::Full)));
    }

    #[tokio::test]
    async fn chan_queue_basic_roundtrip() {
        let q: ChanBlockingQueue<i32> = ChanBlockingQueue::new(4);
        for i in 0..4 {
            q.try_offer(i).unwrap();
        }
        assert!(matches!(q.try_offer(4), Err(GoccError::Full)));
        for i in 0..4 {
            assert_eq!(q.try_pull().unwrap(), i);
        }
        assert!(matches!(q.try_pull(), Err(GoccError::Empty)));
    }

    #[tokio::test]
    async fn chan_queue_pull_timeout_expires() {
        let q: ChanBlockingQueue<i32> = ChanBlockingQueue::new(1);
        let res = q.pull_timeout(Duration::from_millis(20)).await;
        assert!(matches!(res, Err(GoccError::Empty)));
    }

    #[tokio::test]
    async fn capacity_one_alternation() {
        let q = Arc::new(new_default_queue::<i32>(1));
        for i in 0..5 {
            q.offer_timeout(i, Duration::from_millis(50)).await.unwrap();
            assert_eq!(q.pull_timeout(Duration::from_millis(50)).await.unwrap(), i);
        }
    }
}
