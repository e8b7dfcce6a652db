//! HTTP harness subsystem.
//!
//! # Data Flow
//! ```text
//! Accepted TCP stream
//!     → request.rs (request line + query, headers drained)
//!     → server.rs (route to producer, write response head)
//!     → stream::StreamingExchange (body + race)
//! ```
//!
//! # Design Decisions
//! - Deliberately beneath any HTTP framework: the whole point is that the
//!   body producer observes the raw socket write error, which frameworks
//!   consume before application code can see it

pub mod request;
pub mod server;

pub use request::{read_request_head, RequestError, RequestHead};
pub use server::HttpServer;
