//! Streaming failure taxonomy.

use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Application-level wrapper for an unexpected body-production failure.
///
/// Preserves the original failure as its source chain so diagnostics can
/// still reach the transport-level cause.
#[derive(Debug, Clone, Error)]
#[error("something went wrong while streaming the response body")]
pub struct StreamingFailed {
    #[source]
    cause: Arc<io::Error>,
}

impl StreamingFailed {
    /// Wrap a raw cause.
    pub fn new(cause: Arc<io::Error>) -> Self {
        Self { cause }
    }

    /// The underlying cause.
    pub fn cause(&self) -> &io::Error {
        &self.cause
    }
}

/// The single error value handed to the [`ErrorHandler`] for a request.
///
/// Which variant is delivered depends on which failure report wins the
/// dispatch arbiter, not on the nature of the underlying failure alone.
///
/// [`ErrorHandler`]: crate::dispatch::ErrorHandler
#[derive(Debug, Clone, Error)]
pub enum DeliveredError {
    /// Benign peer disconnect, exposed as-is.
    #[error(transparent)]
    RootCause(Arc<io::Error>),
    /// Unexpected body-production failure, wrapped for diagnostics.
    #[error(transparent)]
    Wrapped(StreamingFailed),
}

impl DeliveredError {
    /// Whether this is the unwrapped transport-level cause.
    pub fn is_root_cause(&self) -> bool {
        matches!(self, DeliveredError::RootCause(_))
    }

    /// Whether this is the wrapped application error.
    pub fn is_wrapped(&self) -> bool {
        matches!(self, DeliveredError::Wrapped(_))
    }
}
