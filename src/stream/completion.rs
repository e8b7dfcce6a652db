//! Runtime-driven detection of an unusable connection.
//!
//! # Responsibilities
//! - Watch the transport read half for the peer going away
//! - Publish the peer's half-close (FIN) to the harness
//! - Submit a completion-failure report, never wrapped, when the
//!   connection is found unusable
//!
//! # Design Decisions
//! - A FIN alone is a legal half-close and is only recorded; evidence of
//!   an unusable connection is a read error or the closed flag set by the
//!   write side
//! - The monitor waits on no classification step, which is exactly why it
//!   can beat the body writer to the arbiter

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use crate::dispatch::DispatchArbiter;
use crate::fault::FailureReport;
use crate::net::ConnectionState;

/// Per-request monitor of the transport read half.
///
/// Runs concurrently with the body writer and submits its own root-cause
/// report to the same arbiter on whatever schedule its polling produces.
pub struct CompletionSignal {
    state: Arc<ConnectionState>,
    arbiter: Arc<DispatchArbiter>,
    poll_interval: Duration,
    fin_tx: watch::Sender<bool>,
}

impl CompletionSignal {
    /// Create a monitor for one request. The returned receiver flips to
    /// `true` once the peer half-closes its side.
    pub fn new(
        state: Arc<ConnectionState>,
        arbiter: Arc<DispatchArbiter>,
        poll_interval: Duration,
    ) -> (Self, watch::Receiver<bool>) {
        let (fin_tx, fin_rx) = watch::channel(false);
        (
            Self {
                state,
                arbiter,
                poll_interval,
                fin_tx,
            },
            fin_rx,
        )
    }

    /// Run the monitoring loop until the connection is found unusable and
    /// a report has been submitted. Runs forever on a healthy connection;
    /// the request entry point aborts it when the body completes.
    pub async fn monitor<R>(self, mut read_half: R)
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut buf = [0u8; 512];
        let mut fin_seen = false;
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                res = read_half.read(&mut buf), if !fin_seen => match res {
                    Ok(0) => {
                        // Half-close: remember it, keep polling.
                        fin_seen = true;
                        let _ = self.fin_tx.send(true);
                        tracing::debug!("Peer half-closed the connection");
                    }
                    Ok(n) => {
                        tracing::trace!(bytes = n, "Ignoring stray bytes on read half");
                    }
                    Err(cause) => {
                        self.state.mark_closed();
                        self.submit(cause);
                        return;
                    }
                },
                _ = ticker.tick() => {
                    if self.state.is_closed() {
                        self.submit(io::Error::new(
                            io::ErrorKind::ConnectionReset,
                            "connection is no longer usable",
                        ));
                        return;
                    }
                }
            }
        }
    }

    fn submit(&self, cause: io::Error) {
        tracing::debug!(error = %cause, "Completion monitor observed unusable connection");
        self.arbiter
            .submit(FailureReport::completion_failure(Arc::new(cause)));
    }
}
