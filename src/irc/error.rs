//! Error taxonomy for the IRC layer.
//!
//! Transport failures ([`ConnectionError`]) are fatal to the connection and
//! always leave it in the `Disconnected` state. Command failures
//! ([`CommandError`]) are local to one line of operator input.

use std::io;
use thiserror::Error;

use super::state::ConnectionState;

pub type Result<T, E = ConnectionError> = std::result::Result<T, E>;

/// Errors raised while turning bytes into lines or lines into bytes.
#[derive(Debug, Error)]
pub enum FramingError {
    #[error("line of {actual} bytes exceeds the {limit} byte limit")]
    LineTooLong { actual: usize, limit: usize },

    #[error("outgoing line contains a CR or LF character")]
    EmbeddedTerminator,

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("could not allocate socket: {0}")]
    Socket(#[source] io::Error),

    #[error("could not resolve {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("could not connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// The line was refused before reaching the socket; the connection is
    /// unaffected.
    #[error("refusing to send line: {0}")]
    InvalidLine(#[source] FramingError),

    #[error("send failed: {0}")]
    Send(#[source] FramingError),

    #[error("connection closed: {reason}")]
    ConnectionClosed { reason: String },

    #[error("{operation} is not valid while {state}")]
    InvalidState {
        operation: &'static str,
        state: ConnectionState,
    },
}

impl ConnectionError {
    pub(crate) fn closed(reason: impl Into<String>) -> Self {
        Self::ConnectionClosed {
            reason: reason.into(),
        }
    }

    /// Whether the error ended the connection.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::InvalidLine(_) | Self::InvalidState { .. })
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Command not found: {0}")]
    NotFound(String),

    #[error("Insufficient arguments for /{name}: need {required}, got {given}")]
    InsufficientArguments {
        name: String,
        required: usize,
        given: usize,
    },

    /// The argument count was met but a required argument is blank.
    #[error("Missing {argument} for /{name}")]
    MissingArgument {
        name: String,
        argument: &'static str,
    },

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}
