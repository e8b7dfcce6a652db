//! Classification of body-production failures.
//!
//! # Responsibilities
//! - Decide whether a failure is a benign peer disconnect (deliver as-is)
//!   or unexpected (wrap before delivery)
//! - Recognize a peer-disconnect signature anywhere in a cause chain
//!
//! # Design Decisions
//! - Pure and synchronous: the classifier introduces no race of its own;
//!   timing relative to the completion monitor is entirely the writer's
//! - The wrap decision looks at the top-level `io::ErrorKind` only. A
//!   producer that rethrows its own error around a broken pipe is an
//!   unexpected failure even though the chain bottoms out in a disconnect;
//!   the chain walk is reserved for the closed-flag side effect

use std::error::Error as _;
use std::io;

/// Outcome of classifying a raw failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Benign transport-level disconnect; expose the cause unwrapped.
    RootCause,
    /// Unexpected failure; wrap it in [`StreamingFailed`] before delivery.
    ///
    /// [`StreamingFailed`]: crate::fault::StreamingFailed
    NeedsWrapping,
}

/// Error kinds produced by writing to a socket the peer has torn down.
fn disconnect_kind(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
    )
}

/// Classify a raw failure by its top-level kind.
pub fn classify(cause: &io::Error) -> Verdict {
    if disconnect_kind(cause.kind()) {
        Verdict::RootCause
    } else {
        Verdict::NeedsWrapping
    }
}

/// Whether a peer-disconnect signature appears anywhere in the cause chain.
///
/// Used by the body writer to decide if a failure is itself authoritative
/// evidence that the connection is gone.
pub fn peer_disconnect_signature(cause: &io::Error) -> bool {
    if disconnect_kind(cause.kind()) {
        return true;
    }
    // io::Error::source() skips the custom payload, so descend via get_ref.
    let mut inner = cause
        .get_ref()
        .map(|e| e as &(dyn std::error::Error + 'static));
    while let Some(err) = inner {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            if disconnect_kind(io_err.kind()) {
                return true;
            }
            inner = io_err
                .get_ref()
                .map(|e| e as &(dyn std::error::Error + 'static));
        } else {
            inner = err.source();
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broken_pipe() -> io::Error {
        io::Error::new(io::ErrorKind::BrokenPipe, "Broken pipe")
    }

    #[test]
    fn disconnect_kinds_are_root_cause() {
        for kind in [
            io::ErrorKind::BrokenPipe,
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::ConnectionAborted,
        ] {
            let err = io::Error::new(kind, "peer gone");
            assert_eq!(classify(&err), Verdict::RootCause, "kind {kind:?}");
        }
    }

    #[test]
    fn other_kinds_need_wrapping() {
        for kind in [
            io::ErrorKind::TimedOut,
            io::ErrorKind::WouldBlock,
            io::ErrorKind::Other,
            io::ErrorKind::UnexpectedEof,
        ] {
            let err = io::Error::new(kind, "boom");
            assert_eq!(classify(&err), Verdict::NeedsWrapping, "kind {kind:?}");
        }
    }

    #[test]
    fn classification_ignores_the_chain() {
        // A producer error wrapping a disconnect still needs wrapping.
        let err = io::Error::new(io::ErrorKind::Other, broken_pipe());
        assert_eq!(classify(&err), Verdict::NeedsWrapping);
    }

    #[test]
    fn signature_walks_the_chain() {
        let wrapped_once = io::Error::new(io::ErrorKind::Other, broken_pipe());
        assert!(peer_disconnect_signature(&wrapped_once));

        let wrapped_twice = io::Error::new(io::ErrorKind::Other, wrapped_once);
        assert!(peer_disconnect_signature(&wrapped_twice));

        let unrelated = io::Error::new(io::ErrorKind::Other, "disk full");
        assert!(!peer_disconnect_signature(&unrelated));
    }

    #[test]
    fn classification_is_deterministic() {
        let err = broken_pipe();
        for _ in 0..10 {
            assert_eq!(classify(&err), Verdict::RootCause);
        }
    }
}
