//! Streaming response lifecycle.
//!
//! # Data Flow
//! ```text
//! Request accepted, response head written
//!     → exchange.rs (per-request wiring, one lifecycle each)
//!     → writer.rs (producer runs against the write half)
//!     → completion.rs (monitor runs against the read half)
//!     → dispatch (exactly one delivered report)
//! ```
//!
//! # Design Decisions
//! - Writer and monitor are genuinely concurrent tasks; nothing here
//!   serializes their submissions, by design
//! - Once the peer is gone the write is unrecoverable: there is no retry,
//!   only reporting

pub mod completion;
pub mod exchange;
pub mod writer;

pub use completion::CompletionSignal;
pub use exchange::{ExchangeOptions, StreamingExchange};
pub use writer::{BodyProducer, BodySink, BodyWriter, WriteOutcome};
