//! IMAP connection management.
//!
//! This module provides connection handling for IMAP servers, including:
//! - Configuration (host, port, security mode)
//! - TLS/plaintext stream abstraction
//! - Framed I/O for IMAP protocol
//! - Type-state connection wrapper
//! - A reconnecting [`Session`] wrapper with a single in-flight guard

mod client;
mod config;
mod framed;
mod session;
mod worker;

pub use client::{Authenticated, AuthMechanism, Client, NotAuthenticated, Selected};
pub use config::{Config, ConfigBuilder, Security};
pub use framed::{FramedStream, ResponseAccumulator};
pub use mailcore_transport::{MailStream as ImapStream, connect, create_tls_connector};
pub use session::{Session, SessionConfig};
pub use worker::{InFlightGuard, PROGRESS_INTERVAL, ProgressThrottle, Worker};

use mailcore_transport::{Endpoint, TlsMode};

use crate::Result;

/// Opens a plaintext connection, for `STARTTLS` upgrade or testing.
///
/// # Errors
///
/// Returns an error if DNS resolution or the TCP connect fails.
pub async fn connect_plain(host: &str, port: u16) -> Result<ImapStream> {
    let endpoint = Endpoint::new(host, port);
    Ok(connect(&endpoint).await?)
}

/// Opens a TLS connection from the start (implicit TLS, e.g. port 993).
///
/// # Errors
///
/// Returns an error if DNS resolution, the TCP connect, or the TLS
/// handshake fails.
pub async fn connect_tls(host: &str, port: u16) -> Result<ImapStream> {
    let endpoint = Endpoint::new(host, port).with_tls(TlsMode::Tunnel);
    Ok(connect(&endpoint).await?)
}
