//! Line-buffered I/O over a [`mailcore_transport::MailStream`].

use mailcore_transport::MailStream;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::error::Result;

/// A buffered NNTP connection: one [`MailStream`] (plain or TLS,
/// survives a `STARTTLS` upgrade in place) plus a read-ahead line buffer.
pub struct NntpStream {
    reader: BufReader<MailStream>,
}

impl NntpStream {
    /// Wraps an already-connected [`MailStream`].
    #[must_use]
    pub fn new(stream: MailStream) -> Self {
        Self {
            reader: BufReader::with_capacity(8192, stream),
        }
    }

    /// Reads one CRLF- or LF-terminated line, with the terminator
    /// stripped.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or unexpected EOF.
    pub async fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(crate::Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed",
            )));
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }

    /// Reads a dot-terminated multi-line block (RFC 3977 §3.1.1),
    /// stopping at (and not returning) the lone `.` line, with
    /// dot-stuffing reversed.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or unexpected EOF.
    pub async fn read_dotted_block(&mut self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        loop {
            let line = self.read_line().await?;
            if line == "." {
                break;
            }
            lines.push(line);
        }
        Ok(crate::parser::dedot_lines(lines))
    }

    /// Writes raw bytes (already CRLF-terminated where required) to the
    /// stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_raw(&mut self, data: &[u8]) -> Result<()> {
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
    pub async fn upgrade_to_tls(self, host: &str) -> Result<Self> {
        let inner = self.reader.into_inner();
        let upgraded = inner.upgrade_to_tls(host).await?;
        Ok(Self::new(upgraded))
    }
}
