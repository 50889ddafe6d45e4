//! Error types for NNTP operations.

use std::io;

/// Result type alias for NNTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// NNTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport-level error (DNS, SOCKS, TLS) from `mailcore-transport`.
    #[error("transport error: {0}")]
    Transport(#[from] mailcore_transport::Error),

    /// Server returned an error response code.
    #[error("NNTP error {code}: {message}")]
    Nntp {
        /// Reply code (e.g. 411).
        code: u16,
        /// Reply message text.
        message: String,
    },

    /// Authentication was rejected by the server.
    #[error("authentication failed: {0}")]
    AuthFail(String),

    /// Malformed response line or overview/header record.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Command syntax rejected by the server (500/501).
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Operation attempted with no group selected.
    #[error("no newsgroup selected")]
    NoGroupSelected,

    /// Operation timed out.
    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl Error {
    /// Builds an [`Error::Nntp`] from a reply code and message.
    #[must_use]
    pub fn reply(code: u16, message: impl Into<String>) -> Self {
        Self::Nntp {
            code,
            message: message.into(),
        }
    }
}

/// Stable status codes surfaced across the ABI boundary (spec §6.3),
/// independent of the richer [`Error`] carried internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NntpStatus {
    /// The operation completed successfully.
    Success,
    /// A socket-level (connect/DNS/TLS) error occurred.
    Socket,
    /// Authentication was rejected by the server.
    AuthFail,
    /// A protocol-level error occurred (unexpected response).
    Protocol,
    /// A command was rejected for bad syntax.
    Syntax,
    /// A local I/O error occurred.
    IoErr,
    /// A generic, non-specific error occurred.
    Error,
    /// The server demanded authentication (480) before continuing.
    AuthReq,
    /// The server sent an AUTHINFO continuation (381).
    AuthCont,
}

impl From<&Error> for NntpStatus {
    fn from(err: &Error) -> Self {
        match err {
            Error::Transport(_) => Self::Socket,
            Error::AuthFail(_) => Self::AuthFail,
            Error::Protocol(_) => Self::Protocol,
            Error::Syntax(_) => Self::Syntax,
            Error::Io(_) => Self::IoErr,
            Error::Nntp { code, .. } if *code == 480 => Self::AuthReq,
            Error::Nntp { code, .. } if *code == 381 => Self::AuthCont,
            Error::Nntp { .. } | Error::NoGroupSelected | Error::Timeout(_) => Self::Error,
        }
    }
}
