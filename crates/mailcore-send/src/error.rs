//! Error types for the send dispatcher.

use thiserror::Error;

/// Errors that can occur while parsing or dispatching a queued message.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error reading the queue file or directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The queue file is missing the blank-line terminator between the
    /// header block and the RFC 5322 body, or the header block is not
    /// valid UTF-8.
    #[error("malformed queue file: missing header/body separator")]
    MalformedQueueFile,

    /// The queued message has mail recipients but no SMTP target was
    /// supplied, or newsgroups but no NNTP target.
    #[error("no {0} target configured for this message")]
    NoTarget(&'static str),

    /// An SMTP send was attempted against a queued message with no
    /// recipients.
    #[error("SMTP send attempted with no recipients")]
    NoRecipients,

    /// The SMTP send failed.
    #[error("SMTP send failed: {0}")]
    Smtp(#[from] mailcore_smtp::Error),

    /// The NNTP post failed.
    #[error("NNTP post failed: {0}")]
    Nntp(#[from] mailcore_nntp::Error),

    /// A post-send flag update (reply/forward marking, outbox copy)
    /// failed on the originating store.
    #[error("flag update failed: {0}")]
    FlagUpdate(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
