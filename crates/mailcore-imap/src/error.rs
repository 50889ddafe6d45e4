//! Error types for the IMAP library.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during IMAP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level error (DNS, SOCKS, TLS) from `mailcore-transport`.
    #[error("transport error: {0}")]
    Transport(#[from] mailcore_transport::Error),

    /// Mailbox-name transcoding error from `mailcore-codec` (modified
    /// UTF-7 decode failure during folder-list synchronisation).
    #[error("mailbox name codec error: {0}")]
    Codec(#[from] mailcore_codec::Error),

    /// Protocol parsing error.
    #[error("Protocol error at position {position}: {message}")]
    Parse {
        /// Byte position where the error occurred.
        position: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Server returned NO response.
    #[error("Server returned NO: {0}")]
    No(String),

    /// Server returned BAD response.
    #[error("Server returned BAD: {0}")]
    Bad(String),

    /// Server sent BYE (disconnecting).
    #[error("Server sent BYE: {0}")]
    Bye(String),

    /// Operation timed out.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid state for the requested operation.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Protocol violation or unexpected data.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A command was attempted while another command was already
    /// in flight on this connection. IMAP allows only one outstanding
    /// command per connection; callers should retry.
    #[error("another command is already in progress (EAGAIN)")]
    WouldBlock,
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable status codes surfaced across the FFI/ABI boundary (spec §6.3),
/// independent of the richer [`Error`] carried internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImapStatus {
    /// The operation completed successfully.
    Success,
    /// A generic, non-authentication error occurred.
    Error,
    /// Authentication was rejected by the server.
    AuthFail,
    /// A socket-level (connect/DNS/TLS) error occurred.
    Socket,
    /// A local I/O error occurred (e.g. writing a fetched message to disk).
    IoError,
    /// The command could not be issued because another command is in
    /// flight; the caller should retry.
    Eagain,
}

impl From<&Error> for ImapStatus {
    fn from(err: &Error) -> Self {
        match err {
            Error::Auth(_) => Self::AuthFail,
            Error::Transport(_) => Self::Socket,
            Error::Io(_) => Self::IoError,
            Error::WouldBlock => Self::Eagain,
            Error::Parse { .. }
            | Error::No(_)
            | Error::Bad(_)
            | Error::Bye(_)
            | Error::Timeout(_)
            | Error::InvalidState(_)
            | Error::Codec(_)
            | Error::Protocol(_) => Self::Error,
        }
    }
}
