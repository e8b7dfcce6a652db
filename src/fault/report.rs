//! Failure reports submitted to the dispatch arbiter.

use std::io;
use std::sync::Arc;
use std::time::Instant;

use crate::fault::error::{DeliveredError, StreamingFailed};

/// Which detector produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOrigin {
    /// The body writer observed its write call fail.
    WriteFailure,
    /// The completion monitor independently observed the connection become
    /// unusable.
    CompletionFailure,
}

impl std::fmt::Display for ReportOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportOrigin::WriteFailure => write!(f, "write-failure"),
            ReportOrigin::CompletionFailure => write!(f, "completion-failure"),
        }
    }
}

/// One detector's account of the request failing. Immutable once built.
///
/// Up to two of these can exist per request, one per origin; the arbiter
/// delivers exactly one of them.
#[derive(Debug, Clone)]
pub struct FailureReport {
    origin: ReportOrigin,
    cause: Arc<io::Error>,
    wrapped: Option<StreamingFailed>,
    observed_at: Instant,
}

impl FailureReport {
    /// Report from the body writer. `wrapped` is present when the
    /// classifier decided the failure was unexpected.
    pub fn write_failure(cause: Arc<io::Error>, wrapped: Option<StreamingFailed>) -> Self {
        Self {
            origin: ReportOrigin::WriteFailure,
            cause,
            wrapped,
            observed_at: Instant::now(),
        }
    }

    /// Report from the completion monitor. Never wraps; the raw transport
    /// cause is all this path knows.
    pub fn completion_failure(cause: Arc<io::Error>) -> Self {
        Self {
            origin: ReportOrigin::CompletionFailure,
            cause,
            wrapped: None,
            observed_at: Instant::now(),
        }
    }

    /// Which detector produced this report.
    pub fn origin(&self) -> ReportOrigin {
        self.origin
    }

    /// The raw cause as captured by the detector.
    pub fn cause(&self) -> &io::Error {
        &self.cause
    }

    /// The wrapped application error, when classification produced one.
    pub fn wrapped(&self) -> Option<&StreamingFailed> {
        self.wrapped.as_ref()
    }

    /// When the detector captured the failure.
    pub fn observed_at(&self) -> Instant {
        self.observed_at
    }

    /// The value that reaches the error handler if this report wins:
    /// the wrapped error when present, the raw cause otherwise.
    pub fn delivered_error(&self) -> DeliveredError {
        match &self.wrapped {
            Some(wrapped) => DeliveredError::Wrapped(wrapped.clone()),
            None => DeliveredError::RootCause(Arc::clone(&self.cause)),
        }
    }
}
