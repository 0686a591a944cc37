//! Level-gated logging facade (C10).
//!
//! The trait mirrors the three-level (Debug/Info/Error), formatted-or-line
//! shape of the source's `Logger` interface so that host applications can
//! plug in their own sink. The default implementation forwards to `tracing`,
//! which is the logging crate the rest of this workspace (and the wider
//! example corpus) already standardizes on.

use std::fmt::Display;

/// A pluggable log sink. Implementors decide what "enabled" means for each
/// level; callers are not expected to guard calls with `is_*_enabled`
/// checks themselves, though they may for avoiding expensive formatting.
pub trait Logger: Send + Sync {
    fn debug(&self, msg: &str);
    fn info(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// Default `tracing`-backed logger. Emits at DEBUG/INFO/WARN respectively,
/// WARN standing in for the source's "Error" level since this crate itself
/// never aborts a process on these events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::warn!("{msg}");
    }
}

/// Convenience for callers that want to log a `Display` value without an
/// intermediate `format!` at every call site.
pub fn log_info(logger: &dyn Logger, value: impl Display) {
    logger.info(&value.to_string());
}
