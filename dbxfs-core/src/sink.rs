//! Diagnostic sink
//!
//! Operations that swallow remote failures report them here instead of
//! returning them. The filesystem takes a sink at construction so callers can
//! route or capture these reports.

use crate::error::DbxError;

pub trait DiagnosticSink: Send + Sync {
    fn info(&self, message: &str);

    /// A remote failure that was not propagated to the caller.
    fn warn(&self, operation: &str, path: &str, error: &DbxError);
}

/// Forwards to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn warn(&self, operation: &str, path: &str, error: &DbxError) {
        tracing::warn!(operation, path, error = %error, "remote operation failed");
    }
}
