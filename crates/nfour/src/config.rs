//! Server and transport tunables (C12), grounded on `NewSrvConf`/
//! `NewSrvConfSemaWait`/`NewTransConf`'s fixed defaults.

use std::time::Duration;

/// Server-side duplex listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub idle_timeout: Duration,
    /// How long a connection's reader waits for a free admission slot
    /// before replying with `ExceedConcurrent`.
    pub sema_wait_time: Duration,
    pub concurrency: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(2000),
            write_timeout: Duration::from_millis(2000),
            idle_timeout: Duration::from_secs(600),
            sema_wait_time: Duration::from_millis(1),
            concurrency: 64,
        }
    }
}

impl ServerConfig {
    pub fn new(concurrency: u32) -> Self {
        Self {
            concurrency,
            ..Self::default()
        }
    }

    pub fn with_sema_wait_time(mut self, d: Duration) -> Self {
        self.sema_wait_time = d;
        self
    }

    pub fn with_read_timeout(mut self, d: Duration) -> Self {
        self.read_timeout = d;
        self
    }

    pub fn with_write_timeout(mut self, d: Duration) -> Self {
        self.write_timeout = d;
        self
    }

    pub fn with_idle_timeout(mut self, d: Duration) -> Self {
        self.idle_timeout = d;
        self
    }
}

/// Per-request timeout overrides, grounded on `ReqTimeout`. A zero value
/// for `read_timeout`/`write_timeout` falls back to the transport's
/// configured default.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReqTimeout {
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub wait_concurrent: Duration,
}

/// Client-side transport configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub idle_timeout: Duration,
    pub concurrency: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000), 64)
    }
}

impl TransportConfig {
    /// `rw_timeout` is used for both read and write, matching
    /// `NewTransConf`'s single-parameter constructor.
    pub fn new(rw_timeout: Duration, concurrency: u32) -> Self {
        Self {
            read_timeout: rw_timeout,
            write_timeout: rw_timeout,
            idle_timeout: Duration::from_secs(1800),
            concurrency,
        }
    }

    pub fn with_idle_timeout(mut self, d: Duration) -> Self {
        self.idle_timeout = d;
        self
    }
}
