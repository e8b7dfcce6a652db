//! Per-request wiring of the two failure detectors.
//!
//! # Data Flow
//! ```text
//! transport read half ──▶ CompletionSignal (spawned task) ──┐
//!                                                           ▼
//!                                                    DispatchArbiter ──▶ ErrorHandler
//!                                                           ▲
//! transport write half ─▶ BodyWriter (request task) ────────┘
//! ```
//!
//! The exchange provides no ordering between the two submissions; whoever
//! reaches the arbiter first wins. That race is the point.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::dispatch::{DispatchArbiter, DispatchOutcome, ErrorHandler};
use crate::net::ConnectionState;
use crate::stream::completion::CompletionSignal;
use crate::stream::writer::{BodyProducer, BodyWriter, WriteOutcome};

/// Tuning for one exchange.
#[derive(Debug, Clone)]
pub struct ExchangeOptions {
    /// Test-only delay slept by the body writer between capturing a
    /// failure and submitting its report. `None` in production.
    pub submit_delay: Option<Duration>,
    /// How often the completion monitor polls the closed flag.
    pub poll_interval: Duration,
}

impl Default for ExchangeOptions {
    fn default() -> Self {
        Self {
            submit_delay: None,
            poll_interval: Duration::from_millis(5),
        }
    }
}

/// One streaming response's lifecycle: connection state, arbiter, body
/// writer and completion monitor, created when streaming begins and
/// dropped when the request completes.
pub struct StreamingExchange {
    state: Arc<ConnectionState>,
    arbiter: Arc<DispatchArbiter>,
    options: ExchangeOptions,
    monitor: Option<JoinHandle<()>>,
}

impl StreamingExchange {
    /// Create an exchange delivering at most one error to `handler`.
    pub fn new(handler: Arc<dyn ErrorHandler>, options: ExchangeOptions) -> Self {
        Self {
            state: Arc::new(ConnectionState::new()),
            arbiter: Arc::new(DispatchArbiter::new(handler)),
            options,
            monitor: None,
        }
    }

    /// The shared connection state for this request.
    pub fn state(&self) -> &Arc<ConnectionState> {
        &self.state
    }

    /// Terminal dispatch outcome, if a report has been committed.
    pub fn outcome(&self) -> Option<DispatchOutcome> {
        self.arbiter.outcome()
    }

    /// Start the completion monitor on the transport read half. The
    /// returned receiver flips to `true` when the peer half-closes.
    pub fn spawn_monitor<R>(&mut self, read_half: R) -> watch::Receiver<bool>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (signal, fin_rx) = CompletionSignal::new(
            Arc::clone(&self.state),
            Arc::clone(&self.arbiter),
            self.options.poll_interval,
        );
        self.monitor = Some(tokio::spawn(signal.monitor(read_half)));
        fin_rx
    }

    /// Run the producer against the write half, racing against the
    /// monitor. Resolves the monitor task before returning: on success it
    /// is simply cancelled; on failure it gets one poll window to record
    /// its losing report before cancellation.
    pub async fn write_body<P, W>(&mut self, producer: &P, write_half: &mut W) -> WriteOutcome
    where
        P: BodyProducer,
        W: AsyncWrite + Unpin + Send,
    {
        let writer = BodyWriter::new(
            Arc::clone(&self.state),
            Arc::clone(&self.arbiter),
            self.options.submit_delay,
        );
        let outcome = writer.run(producer, write_half).await;

        if let Some(mut monitor) = self.monitor.take() {
            match outcome {
                WriteOutcome::Completed => monitor.abort(),
                WriteOutcome::Reported(_) => {
                    let grace = self.options.poll_interval * 4;
                    if timeout(grace, &mut monitor).await.is_err() {
                        monitor.abort();
                    }
                }
            }
        }
        outcome
    }
}

impl Drop for StreamingExchange {
    fn drop(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            monitor.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{RecordingHandler, Submission};
    use crate::fault::ReportOrigin;
    use crate::stream::writer::BodySink;
    use std::io;

    /// Producer that writes a payload bound to fail against the gone
    /// peer, catches the write error and rethrows an application failure
    /// around it, the way a streaming handler typically would.
    struct WriteBigThenRethrow;

    impl BodyProducer for WriteBigThenRethrow {
        async fn produce<W: AsyncWrite + Unpin + Send>(
            &self,
            sink: &mut BodySink<'_, W>,
        ) -> io::Result<()> {
            let payload = vec![b'x'; 99_999];
            match sink.write_all(&payload).await {
                Ok(()) => Ok(()),
                Err(e) => Err(io::Error::new(io::ErrorKind::Other, e)),
            }
        }
    }

    fn exchange(
        submit_delay: Option<Duration>,
        poll_interval: Duration,
    ) -> (StreamingExchange, Arc<RecordingHandler>) {
        let handler = Arc::new(RecordingHandler::new());
        let exchange = StreamingExchange::new(
            Arc::clone(&handler) as Arc<dyn ErrorHandler>,
            ExchangeOptions {
                submit_delay,
                poll_interval,
            },
        );
        (exchange, handler)
    }

    #[tokio::test]
    async fn undelayed_failure_delivers_the_wrapping_error() {
        let (mut exchange, handler) = exchange(None, Duration::from_millis(5));

        let (server, client) = tokio::io::duplex(1024);
        let (read_half, mut write_half) = tokio::io::split(server);
        let _fin = exchange.spawn_monitor(read_half);
        drop(client); // peer disconnects before the body is written

        let outcome = exchange
            .write_body(&WriteBigThenRethrow, &mut write_half)
            .await;

        assert_eq!(outcome, WriteOutcome::Reported(Submission::Accepted));
        let handled = handler.handled();
        assert_eq!(handled.len(), 1);
        assert!(handled[0].is_wrapped());

        let dispatch = exchange.outcome().unwrap();
        assert_eq!(dispatch.delivered.origin(), ReportOrigin::WriteFailure);
    }

    #[tokio::test]
    async fn delayed_failure_loses_to_the_completion_monitor() {
        let (mut exchange, handler) = exchange(
            Some(Duration::from_millis(80)),
            Duration::from_millis(1),
        );

        let (server, client) = tokio::io::duplex(1024);
        let (read_half, mut write_half) = tokio::io::split(server);
        let _fin = exchange.spawn_monitor(read_half);
        drop(client);

        let outcome = exchange
            .write_body(&WriteBigThenRethrow, &mut write_half)
            .await;

        // The writer's wrapped report arrives late and is discarded; the
        // root cause, unwrapped, is what got delivered.
        assert_eq!(outcome, WriteOutcome::Reported(Submission::Discarded));
        let handled = handler.handled();
        assert_eq!(handled.len(), 1);
        assert!(handled[0].is_root_cause());

        let dispatch = exchange.outcome().unwrap();
        assert_eq!(dispatch.delivered.origin(), ReportOrigin::CompletionFailure);
        assert_eq!(dispatch.discarded.len(), 1);
        assert_eq!(dispatch.discarded[0].origin(), ReportOrigin::WriteFailure);
    }
}
