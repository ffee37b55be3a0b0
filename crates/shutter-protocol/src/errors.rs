//! Error taxonomy for the wire layer.
//!
//! Transport faults ([`WireError::Timeout`], [`WireError::Closed`]) are kept
//! distinct from semantic faults (malformed headers, unrecognised tags) so
//! the session layer can surface them under different recovery strategies.
//! Nothing here is retried; every variant is fatal to the in-flight
//! operation.

use std::io;

use thiserror::Error;

/// Errors raised while reading or decoding protocol messages.
#[derive(Debug, Error)]
pub enum WireError {
    /// No bytes (or not enough bytes) arrived within the configured window.
    #[error("timed out waiting for data from the device")]
    Timeout,

    /// The stream ended before a complete message was read.
    #[error("device closed the connection mid-message")]
    Closed,

    /// The socket read failed for a reason other than timeout or EOF.
    #[error("failed to read from the device socket: {0}")]
    Read(#[source] io::Error),

    /// A header line kept growing without ever reaching a terminator.
    #[error("message header exceeded {limit} bytes without a newline")]
    HeaderTooLarge { limit: usize },

    /// The header line was not a JSON object of the expected shape.
    #[error("malformed message header: {message}")]
    MalformedHeader {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The header carried a tag this protocol version does not know.
    #[error("unrecognised message tag '{tag}'")]
    UnrecognisedTag { tag: String },

    /// A known tag arrived with an undecodable numeric payload.
    #[error("malformed '{tag}' payload: {message}")]
    MalformedValue { tag: &'static str, message: String },
}

impl WireError {
    /// Creates a malformed header error from a serde failure.
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::MalformedHeader {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a malformed header error with a custom message.
    pub fn malformed_header(message: impl Into<String>) -> Self {
        Self::MalformedHeader {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a malformed value error for the given tag.
    pub fn malformed_value(tag: &'static str, message: impl Into<String>) -> Self {
        Self::MalformedValue {
            tag,
            message: message.into(),
        }
    }

    /// Maps a socket read failure into the wire taxonomy.
    pub(crate) fn from_read_error(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Self::Timeout,
            io::ErrorKind::UnexpectedEof => Self::Closed,
            _ => Self::Read(error),
        }
    }
}
