//! Operator-facing progress logging.

/// Sink for the executor's progress messages.
///
/// Purely informational: implementations must not fail and the executor
/// never branches on what a logger does.
pub trait Logger: Send + Sync {
    fn info(&self, message: &str);

    fn error(&self, message: &str);
}

/// Default logger, forwarding to `tracing` under the `arangom::executor` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!(target: "arangom::executor", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "arangom::executor", "{}", message);
    }
}
