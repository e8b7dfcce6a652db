//! Error handler seam.
//!
//! The handler is an external collaborator from the dispatch protocol's
//! point of view: it consumes the single delivered error per request and
//! must tolerate either the wrapped application error or a raw root cause.

use std::sync::Mutex;

use crate::fault::DeliveredError;

/// Consumer of the one error the arbiter delivers per request.
pub trait ErrorHandler: Send + Sync {
    /// Handle the delivered error. Invoked at most once per request.
    fn handle(&self, error: DeliveredError);
}

/// Handler that logs the delivered error through tracing.
#[derive(Debug, Default)]
pub struct LoggingHandler;

impl ErrorHandler for LoggingHandler {
    fn handle(&self, error: DeliveredError) {
        match &error {
            DeliveredError::RootCause(cause) => {
                tracing::info!(error = %cause, "Handling root cause: peer disconnected");
            }
            DeliveredError::Wrapped(wrapped) => {
                tracing::error!(
                    error = %wrapped,
                    cause = %wrapped.cause(),
                    "Handling wrapped streaming failure"
                );
            }
        }
    }
}

/// Handler that records every delivered error for later inspection.
///
/// Useful when observing dispatch outcomes across many requests, e.g. in
/// repeated-trial runs; also logs like [`LoggingHandler`].
#[derive(Debug, Default)]
pub struct RecordingHandler {
    handled: Mutex<Vec<DeliveredError>>,
}

impl RecordingHandler {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything handled so far, in delivery order.
    pub fn handled(&self) -> Vec<DeliveredError> {
        self.handled.lock().expect("recorder poisoned").clone()
    }

    /// Number of errors handled so far.
    pub fn len(&self) -> usize {
        self.handled.lock().expect("recorder poisoned").len()
    }

    /// Whether nothing has been handled yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain the recorded errors.
    pub fn take(&self) -> Vec<DeliveredError> {
        std::mem::take(&mut *self.handled.lock().expect("recorder poisoned"))
    }
}

impl ErrorHandler for RecordingHandler {
    fn handle(&self, error: DeliveredError) {
        tracing::info!(%error, "Recording handled error");
        self.handled.lock().expect("recorder poisoned").push(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;

    #[test]
    fn recorder_keeps_delivery_order() {
        let recorder = RecordingHandler::new();
        assert!(recorder.is_empty());

        recorder.handle(DeliveredError::RootCause(Arc::new(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "Broken pipe",
        ))));
        recorder.handle(DeliveredError::RootCause(Arc::new(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "Connection reset by peer",
        ))));

        let handled = recorder.handled();
        assert_eq!(handled.len(), 2);
        assert_eq!(handled[0].to_string(), "Broken pipe");
        assert_eq!(handled[1].to_string(), "Connection reset by peer");

        assert_eq!(recorder.take().len(), 2);
        assert!(recorder.is_empty());
    }
}
