//! Body production against the transport write half.
//!
//! # Responsibilities
//! - Run application-supplied body-production logic against a sink
//! - Enforce the no-write-after-closure rule
//! - On failure: mark closure when the signature proves the peer is gone,
//!   classify, wrap when needed, and submit one write-failure report
//!
//! # Design Decisions
//! - A successful body generates no report at all
//! - The optional submission delay exists only to make the dispatch race
//!   reproducible in tests; it is not production behavior

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::sleep;

use crate::dispatch::{DispatchArbiter, Submission};
use crate::fault::{classify, peer_disconnect_signature, FailureReport, StreamingFailed, Verdict};
use crate::net::ConnectionState;

/// Application-supplied body-production logic.
pub trait BodyProducer: Send + Sync {
    /// Write the response body to the sink. Any error returned here is
    /// captured by the body writer as the raw cause of the failure.
    fn produce<W: AsyncWrite + Unpin + Send>(
        &self,
        sink: &mut BodySink<'_, W>,
    ) -> impl Future<Output = io::Result<()>> + Send;
}

/// Output sink handed to the producer.
///
/// Forwards bytes to the transport write half, except that once the
/// connection is known closed every further write fails immediately: a
/// write against a closed peer is certain to fail anyway.
#[derive(Debug)]
pub struct BodySink<'a, W> {
    inner: &'a mut W,
    state: &'a ConnectionState,
    bytes_written: u64,
}

impl<'a, W: AsyncWrite + Unpin + Send> BodySink<'a, W> {
    fn new(inner: &'a mut W, state: &'a ConnectionState) -> Self {
        Self {
            inner,
            state,
            bytes_written: 0,
        }
    }

    fn closed_guard(&self) -> io::Result<()> {
        if self.state.is_closed() {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "connection already marked closed",
            ));
        }
        Ok(())
    }

    /// Write the whole buffer to the transport.
    pub async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.closed_guard()?;
        self.inner.write_all(buf).await?;
        self.bytes_written += buf.len() as u64;
        Ok(())
    }

    /// Flush the transport.
    pub async fn flush(&mut self) -> io::Result<()> {
        self.closed_guard()?;
        self.inner.flush().await
    }

    /// Bytes successfully handed to the transport so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

/// What happened to one body-production run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The producer finished; no report was generated.
    Completed,
    /// The producer failed and a write-failure report was submitted.
    Reported(Submission),
}

/// Executes a producer and turns its failure into a write-failure report.
pub struct BodyWriter {
    state: Arc<ConnectionState>,
    arbiter: Arc<DispatchArbiter>,
    submit_delay: Option<Duration>,
}

impl BodyWriter {
    /// Create a writer for one request. `submit_delay`, when set, is
    /// slept in the failure path before the report is submitted.
    pub fn new(
        state: Arc<ConnectionState>,
        arbiter: Arc<DispatchArbiter>,
        submit_delay: Option<Duration>,
    ) -> Self {
        Self {
            state,
            arbiter,
            submit_delay,
        }
    }

    /// Run the producer against the write half.
    pub async fn run<P, W>(&self, producer: &P, write_half: &mut W) -> WriteOutcome
    where
        P: BodyProducer,
        W: AsyncWrite + Unpin + Send,
    {
        let mut sink = BodySink::new(write_half, &self.state);
        match producer.produce(&mut sink).await {
            Ok(()) => {
                tracing::debug!(bytes = sink.bytes_written(), "Body production completed");
                WriteOutcome::Completed
            }
            Err(cause) => {
                tracing::info!(error = %cause, "Body production failed");

                // A disconnect signature anywhere in the chain is
                // authoritative: the peer is gone.
                if peer_disconnect_signature(&cause) {
                    self.state.mark_closed();
                }

                if let Some(delay) = self.submit_delay {
                    tracing::debug!(?delay, "Delaying failure submission");
                    sleep(delay).await;
                }

                let cause = Arc::new(cause);
                let wrapped = match classify(&cause) {
                    Verdict::NeedsWrapping => Some(StreamingFailed::new(Arc::clone(&cause))),
                    Verdict::RootCause => None,
                };
                let submission = self
                    .arbiter
                    .submit(FailureReport::write_failure(cause, wrapped));
                WriteOutcome::Reported(submission)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::RecordingHandler;
    use crate::fault::ReportOrigin;

    struct Greeting;

    impl BodyProducer for Greeting {
        async fn produce<W: AsyncWrite + Unpin + Send>(
            &self,
            sink: &mut BodySink<'_, W>,
        ) -> io::Result<()> {
            sink.write_all(b"Hallo World!").await?;
            sink.flush().await
        }
    }

    /// Fails with an application error wrapping a broken pipe, the way a
    /// handler that catches its own write error and rethrows would.
    struct RethrowsWrapped;

    impl BodyProducer for RethrowsWrapped {
        async fn produce<W: AsyncWrite + Unpin + Send>(
            &self,
            _sink: &mut BodySink<'_, W>,
        ) -> io::Result<()> {
            let write_error = io::Error::new(io::ErrorKind::BrokenPipe, "Broken pipe");
            Err(io::Error::new(io::ErrorKind::Other, write_error))
        }
    }

    /// Lets the raw transport error propagate untouched.
    struct RawDisconnect;

    impl BodyProducer for RawDisconnect {
        async fn produce<W: AsyncWrite + Unpin + Send>(
            &self,
            _sink: &mut BodySink<'_, W>,
        ) -> io::Result<()> {
            Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "Connection reset by peer",
            ))
        }
    }

    fn fixture() -> (Arc<ConnectionState>, Arc<DispatchArbiter>, Arc<RecordingHandler>) {
        let handler = Arc::new(RecordingHandler::new());
        let arbiter = Arc::new(DispatchArbiter::new(
            Arc::clone(&handler) as Arc<dyn crate::dispatch::ErrorHandler>
        ));
        (Arc::new(ConnectionState::new()), arbiter, handler)
    }

    #[tokio::test]
    async fn successful_body_generates_no_report() {
        let (state, arbiter, handler) = fixture();
        let writer = BodyWriter::new(Arc::clone(&state), Arc::clone(&arbiter), None);

        let (mut server, mut client) = tokio::io::duplex(64);
        let outcome = writer.run(&Greeting, &mut server).await;

        assert_eq!(outcome, WriteOutcome::Completed);
        assert!(!arbiter.is_committed());
        assert!(handler.is_empty());
        assert!(!state.is_closed());

        let mut buf = [0u8; 12];
        tokio::io::AsyncReadExt::read_exact(&mut client, &mut buf)
            .await
            .unwrap();
        assert_eq!(&buf, b"Hallo World!");
    }

    #[tokio::test]
    async fn wrapped_failure_marks_closed_and_delivers_wrapper() {
        let (state, arbiter, handler) = fixture();
        let writer = BodyWriter::new(Arc::clone(&state), Arc::clone(&arbiter), None);

        let (mut server, _client) = tokio::io::duplex(64);
        let outcome = writer.run(&RethrowsWrapped, &mut server).await;

        assert_eq!(outcome, WriteOutcome::Reported(Submission::Accepted));
        assert!(state.is_closed());

        let handled = handler.handled();
        assert_eq!(handled.len(), 1);
        assert!(handled[0].is_wrapped());

        let delivered = arbiter.delivered().unwrap();
        assert_eq!(delivered.origin(), ReportOrigin::WriteFailure);
        assert!(delivered.wrapped().is_some());
    }

    #[tokio::test]
    async fn raw_disconnect_delivers_root_cause_unwrapped() {
        let (state, arbiter, handler) = fixture();
        let writer = BodyWriter::new(Arc::clone(&state), Arc::clone(&arbiter), None);

        let (mut server, _client) = tokio::io::duplex(64);
        let outcome = writer.run(&RawDisconnect, &mut server).await;

        assert_eq!(outcome, WriteOutcome::Reported(Submission::Accepted));
        assert!(state.is_closed());

        let handled = handler.handled();
        assert_eq!(handled.len(), 1);
        assert!(handled[0].is_root_cause());
        assert_eq!(handled[0].to_string(), "Connection reset by peer");
    }

    #[tokio::test]
    async fn writes_after_closure_fail_immediately() {
        let (state, arbiter, _handler) = fixture();
        state.mark_closed();
        let writer = BodyWriter::new(Arc::clone(&state), Arc::clone(&arbiter), None);

        let (mut server, _client) = tokio::io::duplex(64);
        let outcome = writer.run(&Greeting, &mut server).await;

        // The guard turns the attempt into a broken pipe, which classifies
        // as a root cause.
        assert_eq!(outcome, WriteOutcome::Reported(Submission::Accepted));
        let delivered = arbiter.delivered().unwrap();
        assert!(delivered.wrapped().is_none());
    }

    #[tokio::test]
    async fn losing_writer_report_is_discarded() {
        let (state, arbiter, handler) = fixture();
        // Simulate the completion monitor having already committed.
        arbiter.submit(FailureReport::completion_failure(Arc::new(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "Connection reset by peer",
        ))));

        let writer = BodyWriter::new(Arc::clone(&state), Arc::clone(&arbiter), None);
        let (mut server, _client) = tokio::io::duplex(64);
        let outcome = writer.run(&RethrowsWrapped, &mut server).await;

        assert_eq!(outcome, WriteOutcome::Reported(Submission::Discarded));
        assert_eq!(handler.len(), 1);
        assert!(handler.handled()[0].is_root_cause());
        assert_eq!(arbiter.outcome().unwrap().discarded.len(), 1);
    }
}
