//! Minimal HTTP/1.1 request-head parsing.
//!
//! # Responsibilities
//! - Read and parse the request line (method, path, query)
//! - Drain headers up to the blank line
//!
//! # Design Decisions
//! - Only what the harness routes need: no header map, no bodies.
//!   Routing and full HTTP parsing belong to the surrounding transport,
//!   which this crate treats as an external collaborator.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Upper bound on the request head, to keep reads bounded.
const MAX_HEAD_BYTES: usize = 8 * 1024;

/// Error type for request parsing.
#[derive(Debug)]
pub enum RequestError {
    /// Reading from the transport failed.
    Io(std::io::Error),
    /// The request line did not have the `METHOD target VERSION` shape.
    MalformedRequestLine(String),
    /// The peer closed before a full head arrived.
    UnexpectedEof,
    /// The head exceeded [`MAX_HEAD_BYTES`].
    HeadTooLarge,
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::Io(e) => write!(f, "IO error: {}", e),
            RequestError::MalformedRequestLine(line) => {
                write!(f, "malformed request line '{}'", line)
            }
            RequestError::UnexpectedEof => write!(f, "connection closed mid-head"),
            RequestError::HeadTooLarge => write!(f, "request head too large"),
        }
    }
}

impl std::error::Error for RequestError {}

/// The parts of a request the harness routes on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    /// Request method, e.g. `GET`.
    pub method: String,
    /// Path without the query string.
    pub path: String,
    /// Raw query string, without the `?`.
    pub query: Option<String>,
}

impl RequestHead {
    /// Whether a boolean query parameter is set truthy (`name=true` or
    /// `name=1`).
    pub fn query_flag(&self, name: &str) -> bool {
        let Some(query) = &self.query else {
            return false;
        };
        query.split('&').any(|pair| {
            let mut parts = pair.splitn(2, '=');
            parts.next() == Some(name) && matches!(parts.next(), Some("true") | Some("1"))
        })
    }
}

/// Read one request head from a buffered reader, leaving anything after
/// the blank line unread.
pub async fn read_request_head<R>(reader: &mut R) -> Result<RequestHead, RequestError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let mut total = 0usize;

    let n = reader.read_line(&mut line).await.map_err(RequestError::Io)?;
    if n == 0 {
        return Err(RequestError::UnexpectedEof);
    }
    total += n;

    let request_line = line.trim_end();
    let mut parts = request_line.split_whitespace();
    let (method, target, version) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(target), Some(version), None) => (method, target, version),
        _ => {
            return Err(RequestError::MalformedRequestLine(request_line.to_string()));
        }
    };
    if !version.starts_with("HTTP/") {
        return Err(RequestError::MalformedRequestLine(request_line.to_string()));
    }

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (target.to_string(), None),
    };
    let head = RequestHead {
        method: method.to_string(),
        path,
        query,
    };

    // Drain headers; the harness doesn't route on them.
    loop {
        let mut header = String::new();
        let n = reader
            .read_line(&mut header)
            .await
            .map_err(RequestError::Io)?;
        if n == 0 {
            return Err(RequestError::UnexpectedEof);
        }
        total += n;
        if total > MAX_HEAD_BYTES {
            return Err(RequestError::HeadTooLarge);
        }
        if header == "\r\n" || header == "\n" {
            return Ok(head);
        }
    }
}
