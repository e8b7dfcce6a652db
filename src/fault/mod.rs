//! Failure taxonomy and classification.
//!
//! # Data Flow
//! ```text
//! Raw failure (io::Error)
//!     → classifier.rs (RootCause vs NeedsWrapping, top-level kind only)
//!     → error.rs (StreamingFailed wrapper, DeliveredError)
//!     → report.rs (FailureReport, one per detector)
//!     → Submitted to the dispatch arbiter
//! ```
//!
//! # Design Decisions
//! - Classification is a pure function, unit-tested deterministically;
//!   everything probabilistic lives in the dispatch layer
//! - Peer-disconnect kinds (broken pipe, reset, abort) are benign and
//!   delivered unwrapped; everything else wraps

pub mod classifier;
pub mod error;
pub mod report;

pub use classifier::{classify, peer_disconnect_signature, Verdict};
pub use error::{DeliveredError, StreamingFailed};
pub use report::{FailureReport, ReportOrigin};
