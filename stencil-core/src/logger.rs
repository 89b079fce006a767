//! # Logging
//!
//! Store and scheduler events (successful refreshes, failed downloads) are reported through
//! the [`Logger`] trait so applications can route them to their own sink. The default,
//! [`TracingLogger`], forwards everything to `tracing`.
use std::fmt::Debug;

/// A sink for the messages produced by the background refresh machinery.
pub trait Logger: Debug + Send + Sync + 'static {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards messages to the `tracing` macros under the `stencil` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!(target: "stencil", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "stencil", "{message}");
    }
}
