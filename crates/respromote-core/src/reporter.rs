//! Reporter trait for dependency injection
//!
//! The promoter reports what it finds and what it deploys through this
//! trait, so the pipeline is not tied to a particular console or log format.

use std::sync::Arc;

/// Diagnostic sink for a promotion.
pub trait Reporter: Send + Sync {
    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Log a severe condition that does not abort the promotion.
    fn severe(&self, msg: &str);

    /// A destination resource was posted (`executed`) or would have been.
    fn deployed(&self, resource: &str, executed: bool);
}

impl<T: Reporter + ?Sized> Reporter for Arc<T> {
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn severe(&self, msg: &str) {
        (**self).severe(msg);
    }
    fn deployed(&self, resource: &str, executed: bool) {
        (**self).deployed(resource, executed);
    }
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn info(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn severe(&self, _: &str) {}
    fn deployed(&self, _: &str, _: bool) {}
}

/// Forwards every message to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn warning(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    fn severe(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    fn deployed(&self, resource: &str, executed: bool) {
        if executed {
            tracing::info!(resource, "Deployed");
        } else {
            tracing::info!(resource, "Simulated deploy");
        }
    }
}
