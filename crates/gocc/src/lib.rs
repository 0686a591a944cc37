//! Concurrency primitives used by `nfour`'s duplex transport and server:
//! a bounded blocking queue, a counting semaphore, a countdown latch, a
//! cancellable one-shot future with a fixed-size group barrier, a bounded
//! task executor, and a pluggable logging facade.

pub mod config;
pub mod error;
pub mod executor;
pub mod future;
pub mod latch;
pub mod logger;
pub mod queue;
pub mod semaphore;

pub use config::{ExecutorConfig, QueueConfig};
pub use error::GoccError;
pub use executor::{BufferedExecutor, DirectExecutor, ExecTask, Task};
pub use future::{Future, FutureGroup};
pub use latch::CountdownLatch;
pub use logger::{Logger, TracingLogger};
pub use queue::{
    new_default_queue, new_default_queue_from_config, BoundedQueue, ChanBlockingQueue,
    RingBlockingQueue,
};
pub use semaphore::{new_default_semaphore, AtomicSemaphore, Semaphore, TokioSemaphore};
