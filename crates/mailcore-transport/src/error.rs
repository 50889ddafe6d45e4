//! Error types shared by every protocol client built on this transport.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while opening or driving a transport-level connection.
#[derive(Debug, Error)]
pub enum Error {
    /// DNS resolution failed for every strategy/address tried.
    #[error("DNS lookup failed for {host}: {reason}")]
    Lookup {
        /// Hostname that failed to resolve.
        host: String,
        /// Underlying reason, if known.
        reason: String,
    },

    /// Every candidate address failed to connect.
    #[error("connect failed: {0}")]
    Connect(String),

    /// SOCKS4/5 negotiation with the proxy failed.
    #[error("SOCKS proxy error: {0}")]
    Socks(String),

    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake or encryption error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS SNI.
    #[error("invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// An operation exceeded its configured timeout.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// The stream was not in the state required for the requested operation
    /// (e.g. attempting to upgrade an already-TLS stream).
    #[error("invalid transport state: {0}")]
    InvalidState(String),

    /// The session was cancelled by the caller.
    #[error("session cancelled")]
    Cancelled,

    /// The peer closed the connection (unexpected EOF).
    #[error("connection closed by the remote host")]
    Eof,
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
