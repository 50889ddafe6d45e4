//! Line-buffered I/O over a [`mailcore_transport::MailStream`].

use mailcore_transport::{Endpoint, MailStream, TlsMode};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::error::Result;

/// SMTP stream: one [`MailStream`] (plain or TLS, survives a `STARTTLS`
/// upgrade in place) plus a read-ahead line buffer.
#[derive(Debug)]
pub struct SmtpStream {
    reader: BufReader<MailStream>,
}

impl SmtpStream {
    /// Wraps an already-connected [`MailStream`].
    #[must_use]
    pub fn new(stream: MailStream) -> Self {
        Self {
            reader: BufReader::with_capacity(8192, stream),
        }
    }

    /// Reads a reply line, with the CRLF/LF terminator stripped.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        self.reader.read_line(&mut line).await?;
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }

    /// Writes data to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.reader.get_mut().write_all(data).await?;
        self.reader.get_mut().flush().await?;
        Ok(())
    }

    /// Upgrades the underlying stream to TLS in place (`STARTTLS`).
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is already TLS or the handshake
    /// fails.
    pub async fn upgrade_to_tls(self, hostname: &str) -> Result<Self> {
        let inner = self.reader.into_inner();
        let upgraded = inner.upgrade_to_tls(hostname).await?;
        Ok(Self::new(upgraded))
    }
}

/// Connects to an SMTP server over plain TCP (for `STARTTLS` or testing).
///
/// # Errors
///
/// Returns an error if DNS resolution or the TCP connect fails.
pub async fn connect(hostname: &str, port: u16) -> Result<SmtpStream> {
    let endpoint = Endpoint::new(hostname, port);
    let stream = mailcore_transport::connect(&endpoint).await?;
    Ok(SmtpStream::new(stream))
}

/// Connects to an SMTP server over implicit TLS (port 465).
///
/// # Errors
///
/// Returns an error if DNS resolution, the TCP connect, or the TLS
/// handshake fails.
pub async fn connect_tls(hostname: &str, port: u16) -> Result<SmtpStream> {
    let endpoint = Endpoint::new(hostname, port).with_tls(TlsMode::Tunnel);
    let stream = mailcore_transport::connect(&endpoint).await?;
    Ok(SmtpStream::new(stream))
}
