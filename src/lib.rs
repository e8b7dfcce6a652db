//! streamfault: reproduction harness for the client-abort error-dispatch
//! race in streaming HTTP responses.
//!
//! # The race
//!
//! A server streams a response body; the client disconnects mid-write. Two
//! independent detectors notice the same event:
//!
//! - the body writer, whose write call fails once the peer is gone; it
//!   classifies the failure and (when unexpected) wraps it in an
//!   application error before reporting, and
//! - the completion monitor, a runtime-driven path that notices the
//!   connection became unusable on its own schedule and reports the raw
//!   transport cause.
//!
//! Both submit to a dispatch arbiter that commits exactly one report and
//! hands it to the error handler; the other is discarded. Which one wins
//! is genuinely nondeterministic: normally the writer's wrapped error
//! arrives first, but when the writer's failure path is slow (simulated
//! with a configurable delay) the unwrapped root cause wins instead. The
//! arbiter's single-delivery guarantee holds either way; the crate
//! preserves the race rather than serializing it away, because the race
//! is the behavior under study.

// Core subsystems
pub mod config;
pub mod http;
pub mod net;

// The dispatch protocol
pub mod dispatch;
pub mod fault;
pub mod stream;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::FaultConfig;
pub use dispatch::{DispatchArbiter, DispatchOutcome, ErrorHandler};
pub use fault::{DeliveredError, FailureReport, ReportOrigin, StreamingFailed};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use net::ConnectionState;
pub use stream::{ExchangeOptions, StreamingExchange};
