//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via tracing; the delivered error is what
//!   monitoring sees, since the client is already gone
//! - Discarded reports are logged at debug, never re-raised

pub mod logging;
