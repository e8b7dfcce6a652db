//! Single-delivery dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! FailureReport (from body writer)      FailureReport (from completion monitor)
//!         └──────────────┬────────────────────────┘
//!                        ▼
//!             arbiter.rs (Idle → Committed, first submission wins)
//!                        ▼
//!             handler.rs (ErrorHandler, invoked exactly once)
//! ```
//!
//! # Design Decisions
//! - The arbiter never fails; a failure report is business data, not an
//!   arbiter-level error
//! - Wrap-vs-root-cause and first-wins arbitration are separate concerns:
//!   the classifier is tested deterministically, the arbiter under stress

pub mod arbiter;
pub mod handler;

pub use arbiter::{DispatchArbiter, DispatchOutcome, Submission};
pub use handler::{ErrorHandler, LoggingHandler, RecordingHandler};
