//! Logging facilities for Trellis.
//!
//! Trellis uses the `tracing` crate for instrumentation and never installs a
//! subscriber itself. To see logs, install one in the host application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("trellis::grid=debug,trellis::form=trace")
//!     .init();
//! ```

use std::time::Instant;

/// Span names used throughout Trellis for tracing.
pub mod span_names {
    /// Grid view derivation (filter, sort, paginate).
    pub const GRID_DERIVE: &str = "trellis::grid::derive";
    /// Full validation pass over a form.
    pub const FORM_VALIDATE: &str = "trellis::form::validate";
    /// Form submit pipeline.
    pub const FORM_SUBMIT: &str = "trellis::form::submit";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core plumbing target.
    pub const CORE: &str = "trellis_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "trellis_core::signal";
    /// Data grid target.
    pub const GRID: &str = "trellis::grid";
    /// Row search target.
    pub const SEARCH: &str = "trellis::grid::search";
    /// Form engine target.
    pub const FORM: &str = "trellis::form";
    /// Validation rule evaluation target.
    pub const VALIDATION: &str = "trellis::form::validation";
    /// Pipeline timing target.
    pub const PERF: &str = "trellis::perf";
}

/// A guard that times a pipeline stage.
///
/// The elapsed time is logged at `trace` level on the [`targets::PERF`]
/// target when the guard is dropped.
///
/// ```
/// use trellis_core::PerfSpan;
///
/// {
///     let _span = PerfSpan::new("sort");
///     // work...
/// }
/// ```
pub struct PerfSpan {
    operation: &'static str,
    started: Instant,
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(operation: &'static str) -> Self {
        let span = tracing::trace_span!(target: "trellis::perf", "perf", operation = operation);
        Self {
            operation,
            started: Instant::now(),
            _span: span.entered(),
        }
    }

    /// Name of the timed operation.
    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

impl Drop for PerfSpan {
    fn drop(&mut self) {
        tracing::trace!(
            target: targets::PERF,
            operation = self.operation,
            elapsed_us = self.started.elapsed().as_micros() as u64,
            "stage finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perf_span_with_subscriber() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("trellis::perf=trace")
            .with_test_writer()
            .try_init();

        let span = PerfSpan::new("test_operation");
        assert_eq!(span.operation(), "test_operation");
    }

    #[test]
    fn test_targets_are_namespaced() {
        for target in [targets::GRID, targets::SEARCH, targets::FORM, targets::VALIDATION] {
            assert!(target.starts_with("trellis::"));
        }
        assert!(targets::SIGNAL.starts_with(targets::CORE));
    }
}
