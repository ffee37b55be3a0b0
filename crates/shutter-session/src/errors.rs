//! Session-level error taxonomy.
//!
//! Callers need to tell transport faults (reconnect and retry the run) apart
//! from protocol faults (version mismatch, so abort) and from convergence
//! faults (the hardware or scene is the problem). Each class gets its own
//! variants; nothing is caught or retried inside the session.

use std::io;

use thiserror::Error;

use shutter_protocol::WireError;

use crate::convergence::Subsystem;

/// Errors surfaced by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Device address did not resolve.
    #[error("failed to resolve device address {endpoint}: {source}")]
    Resolve {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// Connection to the device could not be established.
    #[error("failed to connect to device at {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// Socket timeouts could not be installed on the fresh connection.
    #[error("failed to configure socket timeouts: {0}")]
    Configure(#[source] io::Error),

    /// Unix endpoints cannot be used on this platform.
    #[cfg(not(unix))]
    #[error("platform does not support Unix sockets: {0}")]
    UnsupportedUnixTransport(String),

    /// A command could not be written to the transport.
    #[error("failed to send command to the device: {0}")]
    SendCommand(#[source] io::Error),

    /// The transport produced no data within the configured window.
    #[error("transport timed out waiting for the device")]
    Timeout,

    /// The device closed the stream mid-operation; the session is unusable.
    #[error("device closed the connection")]
    Closed,

    /// Well-formed bytes that the protocol cannot accept.
    #[error("protocol violation during {context}: {source}")]
    Protocol {
        context: &'static str,
        #[source]
        source: WireError,
    },

    /// A valid message arrived that the active operation does not accept.
    #[error("unexpected '{tag}' message during {context}")]
    UnexpectedMessage {
        tag: &'static str,
        context: &'static str,
    },

    /// The device signalled 3A completion without reporting every requested
    /// subsystem. A hardware or scene problem, not a transport fault.
    #[error("3A completed without results for requested subsystems: {}", list_subsystems(.missing))]
    Convergence { missing: Vec<Subsystem> },

    /// A burst needs at least one capture request; nothing was sent.
    #[error("a burst requires at least one capture request")]
    EmptyBurst,

    /// Invariant breakage inside the session itself.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl SessionError {
    /// Folds a wire fault into the session taxonomy, tagging protocol
    /// violations with the operation they interrupted.
    pub(crate) fn from_wire(error: WireError, context: &'static str) -> Self {
        match error {
            WireError::Timeout => Self::Timeout,
            WireError::Closed => Self::Closed,
            other => Self::Protocol {
                context,
                source: other,
            },
        }
    }

    /// Creates an internal error.
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True when the failure came from the transport rather than from
    /// protocol semantics; reconnecting is the plausible recovery.
    #[must_use]
    pub fn is_transport_fault(&self) -> bool {
        matches!(
            self,
            Self::Resolve { .. }
                | Self::Connect { .. }
                | Self::Configure(_)
                | Self::SendCommand(_)
                | Self::Timeout
                | Self::Closed
        )
    }
}

fn list_subsystems(missing: &[Subsystem]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_timeout_folds_to_session_timeout() {
        let error = SessionError::from_wire(WireError::Timeout, "burst capture");
        assert!(matches!(error, SessionError::Timeout));
        assert!(error.is_transport_fault());
    }

    #[test]
    fn wire_decode_faults_fold_to_protocol() {
        let error = SessionError::from_wire(
            WireError::UnrecognisedTag {
                tag: "bogus".to_owned(),
            },
            "burst capture",
        );
        assert!(matches!(error, SessionError::Protocol { context: "burst capture", .. }));
        assert!(!error.is_transport_fault());
    }

    #[test]
    fn convergence_error_names_missing_subsystems() {
        let error = SessionError::Convergence {
            missing: vec![Subsystem::Ae, Subsystem::Af],
        };
        assert_eq!(
            error.to_string(),
            "3A completed without results for requested subsystems: AE, AF"
        );
    }
}
