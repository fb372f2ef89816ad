//! Pluggable logging boundary (spec's ambient logging section, `SPEC_FULL.md` §B). The engine
//! logs exclusively through this trait rather than calling `tracing` macros directly, so a host
//! can redirect or silence engine logs without touching its own subscriber configuration —
//! `TracingLogger` is simply the default implementation, forwarding to `tracing`.

pub trait Logger: Send + Sync {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards every call to the corresponding `tracing` macro. What the teacher's own crates do
/// throughout (see `loom/src/lib.rs`'s `ctor`-installed `tracing_subscriber` in tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!("{message}");
    }
    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }
    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }
    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn debug(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}
