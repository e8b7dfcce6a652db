//! Connection identity and closed-state tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Track whether the peer connection is known to be closed
//! - Record when closure was first observed
//!
//! # Design Decisions
//! - The closed flag is the one piece of state mutated from two tasks
//!   (body writer and completion monitor); it is a single atomic
//!   compare-and-set, not a lock, so the race's timing stays representative
//! - The open → closed transition happens at most once and never reverts

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

/// Global atomic counter for connection IDs.
/// Relaxed ordering is sufficient since we only need uniqueness.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Per-request record of whether the peer connection is known closed.
///
/// Both the body writer and the completion monitor may detect closure; the
/// first caller of [`mark_closed`](Self::mark_closed) wins and records the
/// instant. Readers on either task observe a stable `closed_at` afterwards.
#[derive(Debug, Default)]
pub struct ConnectionState {
    /// Whether the connection is known closed. Single open → closed flip.
    closed: AtomicBool,
    /// Instant of the first closure detection. Written once by the winner.
    closed_at: OnceLock<Instant>,
}

impl ConnectionState {
    /// Create a new state in the open position.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the connection closed. Idempotent: the first caller wins,
    /// records `closed_at`, and gets `true`; later callers get `false` and
    /// observe the winner's timestamp.
    pub fn mark_closed(&self) -> bool {
        let won = self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            let _ = self.closed_at.set(Instant::now());
            tracing::debug!("connection marked closed");
        }
        won
    }

    /// Non-blocking read of the closed flag.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Instant of the first closure detection, if any.
    ///
    /// May briefly lag `is_closed()` while the winning `mark_closed` call
    /// is between the flag flip and the timestamp store.
    pub fn closed_at(&self) -> Option<Instant> {
        self.closed_at.get().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn starts_open() {
        let state = ConnectionState::new();
        assert!(!state.is_closed());
        assert!(state.closed_at().is_none());
    }

    #[test]
    fn mark_closed_idempotent() {
        let state = ConnectionState::new();
        assert!(state.mark_closed());
        let first = state.closed_at().unwrap();

        assert!(!state.mark_closed());
        assert!(!state.mark_closed());
        assert!(state.is_closed());
        assert_eq!(state.closed_at().unwrap(), first);
    }

    #[test]
    fn concurrent_mark_closed_has_one_winner() {
        let state = Arc::new(ConnectionState::new());
        let handles: Vec<_> = (0..32)
            .map(|_| {
                let state = Arc::clone(&state);
                std::thread::spawn(move || state.mark_closed())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert!(state.is_closed());
        assert!(state.closed_at().is_some());
    }
}
