//! Race-resolution core: first failure report wins, all others discarded.
//!
//! # States
//! - Idle: no report committed yet
//! - Committed: one report stored and delivered to the handler
//!
//! # State Transitions
//! ```text
//! Idle → Committed: first submit() from either detector
//! ```
//!
//! # Design Decisions
//! - The transition is a single-assignment cell, linearizable across the
//!   submitting tasks; exactly one submission is ever accepted
//! - Which report wins is whatever ordering the scheduler and transport
//!   produce; the arbiter guarantees single delivery, nothing more
//! - Losing reports are kept and logged for diagnostics, never delivered

use std::sync::{Arc, Mutex, OnceLock};

use crate::dispatch::handler::ErrorHandler;
use crate::fault::FailureReport;

/// Result of offering a report to the arbiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// This report committed the arbiter and reached the handler.
    Accepted,
    /// The arbiter was already committed; the report was recorded as
    /// discarded and the handler was not invoked.
    Discarded,
}

/// Terminal snapshot of a request's dispatch: the one delivered report and
/// every report that lost the race.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// The report that won the race.
    pub delivered: FailureReport,
    /// Losing reports, in arrival order.
    pub discarded: Vec<FailureReport>,
}

/// Accepts failure reports from both detectors and guarantees exactly one
/// of them reaches the error handler.
pub struct DispatchArbiter {
    delivered: OnceLock<FailureReport>,
    discarded: Mutex<Vec<FailureReport>>,
    handler: Arc<dyn ErrorHandler>,
}

impl std::fmt::Debug for DispatchArbiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchArbiter")
            .field("committed", &self.is_committed())
            .finish_non_exhaustive()
    }
}

impl DispatchArbiter {
    /// Create an idle arbiter delivering to `handler`.
    pub fn new(handler: Arc<dyn ErrorHandler>) -> Self {
        Self {
            delivered: OnceLock::new(),
            discarded: Mutex::new(Vec::new()),
            handler,
        }
    }

    /// Submit a report. The first submission commits the arbiter and
    /// invokes the handler with the report's delivered value; every later
    /// submission is discarded without a handler invocation.
    pub fn submit(&self, report: FailureReport) -> Submission {
        match self.delivered.set(report) {
            Ok(()) => {
                // Winner path: the cell now holds our report.
                let delivered = self
                    .delivered
                    .get()
                    .expect("committed cell must hold the report");
                tracing::debug!(
                    origin = %delivered.origin(),
                    cause = %delivered.cause(),
                    wrapped = delivered.wrapped().is_some(),
                    "Failure report committed"
                );
                self.handler.handle(delivered.delivered_error());
                Submission::Accepted
            }
            Err(report) => {
                tracing::debug!(
                    origin = %report.origin(),
                    cause = %report.cause(),
                    "Failure report discarded; arbiter already committed"
                );
                self.discarded
                    .lock()
                    .expect("discarded list poisoned")
                    .push(report);
                Submission::Discarded
            }
        }
    }

    /// Whether a report has been committed.
    pub fn is_committed(&self) -> bool {
        self.delivered.get().is_some()
    }

    /// The committed report, if any.
    pub fn delivered(&self) -> Option<&FailureReport> {
        self.delivered.get()
    }

    /// Snapshot of the terminal outcome once committed.
    pub fn outcome(&self) -> Option<DispatchOutcome> {
        let delivered = self.delivered.get()?.clone();
        let discarded = self
            .discarded
            .lock()
            .expect("discarded list poisoned")
            .clone();
        Some(DispatchOutcome {
            delivered,
            discarded,
        })
    }
}
