//! Process lifecycle.
//!
//! # Design Decisions
//! - A single broadcast channel fans the shutdown signal out to the accept
//!   loop; in-flight requests finish on their own timetable

pub mod shutdown;

pub use shutdown::Shutdown;
