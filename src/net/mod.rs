//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (connection id, closed-state tracking)
//!     → Hand off to HTTP harness
//!
//! Closed-state transitions:
//!     Open → Closed (exactly once, never reverts)
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - The closed flag is shared by exactly two tasks per request and is an
//!   atomic compare-and-set, the only shared mutable state in the crate

pub mod connection;
pub mod listener;

pub use connection::{ConnectionId, ConnectionState};
pub use listener::Listener;
