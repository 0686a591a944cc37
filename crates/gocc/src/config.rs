//! Builder-style configuration for the queue/semaphore-backed primitives,
//! in the shape of the teacher's `StreamConfig` (fixed defaults, named
//! presets, `with_*` builders).

use std::time::Duration;

/// Tunables for a bounded queue realization.
#[derive(Debug, Clone, Copy)]
pub struct QueueConfig {
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { capacity: 128 }
    }
}

impl QueueConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Preset for short-lived, latency-sensitive pipelines: a small buffer
    /// so producers feel backpressure quickly instead of queueing deeply.
    pub fn low_latency() -> Self {
        Self { capacity: 16 }
    }

    /// Preset for batch-style workloads that tolerate deep queueing.
    pub fn high_throughput() -> Self {
        Self { capacity: 4096 }
    }
}

/// Tunables for a buffered executor's admission queue.
#[derive(Debug, Clone, Copy)]
pub struct ExecutorConfig {
    /// Queue capacity for pending `{task, future}` pairs.
    pub queue_capacity: usize,
    /// Concurrency cap enforced by the executor's semaphore.
    pub concurrency: u32,
    /// How long the dispatcher waits for a free permit per item before
    /// re-checking cancellation.
    pub permit_wait: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 128,
            concurrency: 16,
            permit_wait: Duration::from_millis(50),
        }
    }
}

impl ExecutorConfig {
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_concurrency(mut self, concurrency: u32) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Preset for short-lived, latency-sensitive tasks: small queue, tight
    /// permit-wait polling.
    pub fn low_latency() -> Self {
        Self {
            queue_capacity: 32,
            concurrency: 8,
            permit_wait: Duration::from_millis(5),
        }
    }

    /// Preset for batch-style workloads: large queue, relaxed polling.
    pub fn high_throughput() -> Self {
        Self {
            queue_capacity: 4096,
            concurrency: 64,
            permit_wait: Duration::from_millis(100),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_values() {
        let cfg = ExecutorConfig::default();
        assert_eq!(cfg.queue_capacity, 128);
        assert_eq!(cfg.concurrency, 16);
    }

    #[test]
    fn queue_config_presets_differ() {
        assert_eq!(QueueConfig::default().capacity, 128);
        assert!(QueueConfig::low_latency().capacity < QueueConfig::high_throughput().capacity);
    }

    #[test]
    fn builders_override_fields() {
        let cfg = ExecutorConfig::default()
            .with_queue_capacity(4)
            .with_concurrency(2);
        assert_eq!(cfg.queue_capacity, 4);
        assert_eq!(cfg.concurrency, 2);
    }
}
