//! Task executor (C5): runs user closures bounded by a semaphore.
//!
//! `DirectExecutor` is grounded on the source's `defaultExecutor.go`/
//! `chanExecutor.go` (acquire permit, spawn, release on completion), and
//! cross-grounded on `other_examples`' `BoundedExecutor::spawn`/
//! `with_permit` admission-then-release pattern. `BufferedExecutor` is
//! grounded on `bufferedExecutor.go`'s single-dispatcher design.

use std::sync::Arc;
use std::time::Duration;

use crate::config::ExecutorConfig;
use crate::error::GoccError;
use crate::future::{Future, FutureGroup};
use crate::queue::BoundedQueue;
use crate::semaphore::{Semaphore, TokioSemaphore};

/// A user task: produces a result or an error, matching the source's
/// `func() (any, error)` shape generalized over `T`.
pub type Task<T> = Box<dyn FnOnce() -> Result<T, GoccError> + Send + 'static>;

/// Direct executor: acquires a permit, spawns a worker that runs the task
/// unless it was cancelled first, then releases the permit.
pub struct DirectExecutor {
    semaphore: Arc<TokioSemaphore>,
}

impl DirectExecutor {
    pub fn new(concurrency: u32) -> Self {
        Self {
            semaphore: Arc::new(TokioSemaphore::new(concurrency)),
        }
    }

    pub fn execute<T: Clone + Send + 'static>(&self, task: Task<T>) -> Option<Arc<Future<T>>> {
        if !self.semaphore.try_acquire() {
            return None;
        }
        let future = Future::new();
        spawn_worker(task, future.clone(), self.semaphore.clone());
        Some(future)
    }

    pub async fn execute_timeout<T: Clone + Send + 'static>(
        &self,
        task: Task<T>,
        d: Duration,
    ) -> Option<Arc<Future<T>>> {
        if !self.semaphore.acquire_timeout(d).await {
            return None;
        }
        let future = Future::new();
        spawn_worker(task, future.clone(), self.semaphore.clone());
        Some(future)
    }

    pub fn execute_in_group<T: Clone + Send + 'static>(
        &self,
        task: Task<T>,
        group: &Arc<FutureGroup<T>>,
    ) -> Option<Arc<Future<T>>> {
        if !self.semaphore.try_acquire() {
            return None;
        }
        let future = Future::with_group(group.latch());
        group.add(future.clone());
        spawn_worker(task, future.clone(), self.semaphore.clone());
        Some(future)
    }

    pub async fn execute_in_group_timeout<T: Clone + Send + 'static>(
        &self,
        task: Task<T>,
        group: &Arc<FutureGroup<T>>,
        d: Duration,
    ) -> Option<Arc<Future<T>>> {
        if !self.semaphore.acquire_timeout(d).await {
            return None;
        }
        let future = Future::with_group(group.latch());
        group.add(future.clone());
        spawn_worker(task, future.clone(), self.semaphore.clone());
        Some(future)
    }
}

fn spawn_worker<T: Clone + Send + 'static>(
    task: Task<T>,
    future: Arc<Future<T>>,
    semaphore: Arc<TokioSemaphore>,
) {
    tokio::spawn(async move {
        if !future.is_cancelled() {
            // `Task` is a plain sync closure that may block (the source's
            // tasks ran on their own goroutine); run it on the blocking
            // pool rather than tying up an async worker thread.
            match tokio::task::spawn_blocking(task).await {
                Ok(result) => future.accept(result),
                Err(_join_err) => future.accept(Err(GoccError::TaskCancelled)),
            }
        } else {
            future.accept(Err(GoccError::TaskCancelled));
        }
        semaphore.release();
    });
}

/// `{task, future}` pair admitted into a buffered executor's queue.
pub struct ExecTask<T: Clone + Send + 'static> {
    task: Task<T>,
    future: Arc<Future<T>>,
}

/// Buffered executor: a bounded queue of `{task, future}` drained by a
/// single dispatcher task, which attempts to acquire a permit per item
/// (with a wait timeout) before spawning the worker.
pub struct BufferedExecutor<T: Clone + Send + 'static, Q: BoundedQueue<ExecTask<T>> + 'static> {
    queue: Arc<Q>,
    _marker: std::marker::PhantomData<T>,
}

/// How long the dispatcher waits on an empty queue before re-checking;
/// matches `bufferedExecutor.go`'s five-second `PullTimeout`.
const DISPATCH_POLL_INTERVAL: Duration = Duration::from_secs(5);

impl<T: Clone + Send + 'static, Q: BoundedQueue<ExecTask<T>> + 'static> BufferedExecutor<T, Q> {
    /// Builds a dispatcher with `cfg.concurrency` permits; the dispatcher
    /// waits up to `cfg.permit_wait` for a free permit per item before
    /// re-checking cancellation, so `low_latency`/`high_throughput` presets
    /// change both admission width and dispatch latency.
    pub fn new(queue: Q, cfg: ExecutorConfig) -> Self {
        let queue = Arc::new(queue);
        let semaphore = Arc::new(TokioSemaphore::new(cfg.concurrency));
        tokio::spawn(dispatch(queue.clone(), semaphore, cfg.permit_wait));
        Self {
            queue,
            _marker: std::marker::PhantomData,
        }
    }

    /// Admits `{task, future}` without waiting; fails if the queue is full.
    pub fn execute(&self, task: Task<T>) -> Option<Arc<Future<T>>> {
        let future = Future::new();
        let exec_task = ExecTask {
            task,
            future: future.clone(),
        };
        self.queue.try_offer(exec_task).ok()?;
        Some(future)
    }

    /// Admits `{task, future}`, waiting up to `d` for queue capacity.
    pub async fn execute_timeout(&self, task: Task<T>, d: Duration) -> Option<Arc<Future<T>>> {
        let future = Future::new();
        let exec_task = ExecTask {
            task,
            future: future.clone(),
        };
        self.queue.offer_timeout(exec_task, d).await.ok()?;
        Some(future)
    }

    pub fn execute_in_group(
        &self,
        task: Task<T>,
        group: &Arc<FutureGroup<T>>,
    ) -> Option<Arc<Future<T>>> {
        let future = Future::with_group(group.latch());
        group.add(future.clone());
        let exec_task = ExecTask {
            task,
            future: future.clone(),
        };
        self.queue.try_offer(exec_task).ok()?;
        Some(future)
    }

    pub async fn execute_in_group_timeout(
        &self,
        task: Task<T>,
        group: &Arc<FutureGroup<T>>,
        d: Duration,
    ) -> Option<Arc<Future<T>>> {
        let future = Future::with_group(group.latch());
        group.add(future.clone());
        let exec_task = ExecTask {
            task,
            future: future.clone(),
        };
        self.queue.offer_timeout(exec_task, d).await.ok()?;
        Some(future)
    }
}

async fn dispatch<T: Clone + Send + 'static, Q: BoundedQueue<ExecTask<T>> + 'static>(
    queue: Arc<Q>,
    semaphore: Arc<TokioSemaphore>,
    permit_wait: Duration,
) {
    loop {
        let exec_task = match queue.pull_timeout(DISPATCH_POLL_INTERVAL).await {
            Ok(t) => t,
            Err(_) => continue,
        };
        let ExecTask { task, future } = exec_task;

        if future.is_cancelled() {
            future.accept(Err(GoccError::TaskCancelled));
            continue;
        }

        loop {
            if semaphore.acquire_timeout(permit_wait).await {
                break;
            }
            if future.is_cancelled() {
                future.accept(Err(GoccError::TaskCancelled));
                break;
            }
        }

        if future.try_get().is_ok() {
            // Already completed with TaskCancelled above; nothing to run.
            continue;
        }

        let sem = semaphore.clone();
        tokio::spawn(async move {
            if future.is_cancelled() {
                future.accept(Err(GoccError::TaskCancelled));
            } else {
                match tokio::task::spawn_blocking(task).await {
                    Ok(result) => future.accept(result),
                    Err(_join_err) => future.accept(Err(GoccError::TaskCancelled)),
                }
            }
            sem.release();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::ChanBlockingQueue;
    use std::time::Duration;

    #[tokio::test]
    async fn direct_executor_bounds_concurrency() {
        let executor = DirectExecutor::new(1);
        let f1 = executor
            .execute(Box::new(|| {
                std::thread::sleep(Duration::from_millis(10));
                Ok::<_, GoccError>(1)
            }))
            .unwrap();
        // second call denied immediately: no free permit yet
        assert!(executor.execute(Box::new(|| Ok::<_, GoccError>(2))).is_none());
        assert_eq!(f1.get().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn cancelled_buffered_task_does_not_run() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc as StdArc;

        let queue = ChanBlockingQueue::new(4);
        let executor = BufferedExecutor::new(queue, ExecutorConfig::default().with_concurrency(1));

        let a_ran = StdArc::new(AtomicBool::new(false));
        let a_ran2 = a_ran.clone();
        let future_a = executor
            .execute(Box::new(move || {
                a_ran2.store(true, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(50));
                Ok::<_, GoccError>(1)
            }))
            .unwrap();

        let b_ran = StdArc::new(AtomicBool::new(false));
        let b_ran2 = b_ran.clone();
        let future_b = executor
            .execute(Box::new(move || {
                b_ran2.store(true, Ordering::SeqCst);
                Ok::<_, GoccError>(2)
            }))
            .unwrap();
        future_b.cancel();

        assert_eq!(future_a.get().await.unwrap(), 1);
        assert!(matches!(future_b.get().await, Err(GoccError::TaskCancelled)));
        assert!(a_ran.load(Ordering::SeqCst));
        assert!(!b_ran.load(Ordering::SeqCst));
    }
}
