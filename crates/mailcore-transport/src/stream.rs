//! Plain/TLS transport stream shared by every protocol client (spec §4.1
//! components 1 and 4: socket substrate + TLS tunnel/STARTTLS).

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use crate::endpoint::{Endpoint, SocksType, TlsMode};
use crate::error::{Error, Result};
use crate::resolver;
use crate::socks;

/// A stream that is either plaintext TCP or TLS-wrapped TCP.
///
/// Every protocol client (IMAP, NNTP, SMTP) is generic over nothing more
/// than this enum: the same type survives a STARTTLS upgrade in place.
pub enum MailStream {
    /// Plaintext TCP stream (possibly tunneled through a SOCKS proxy).
    Plain(TcpStream),
    /// TLS-encrypted stream (boxed to keep the enum small).
    Tls(Box<TlsStream<TcpStream>>),
}

impl MailStream {
    /// Wraps an already-connected plaintext stream.
    pub const fn plain(stream: TcpStream) -> Self {
        Self::Plain(stream)
    }

    /// Wraps an already-established TLS stream.
    pub fn tls(stream: TlsStream<TcpStream>) -> Self {
        Self::Tls(Box::new(stream))
    }

    /// Upgrades a plaintext stream to TLS in place, as with SMTP's
    /// `STARTTLS`, IMAP's `STARTTLS`, or NNTP's `STARTTLS`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if the stream is already TLS, or a
    /// TLS/IO error if the handshake fails.
    pub async fn upgrade_to_tls(self, host: &str) -> Result<Self> {
        match self {
            Self::Plain(tcp) => {
                let connector = create_tls_connector()?;
                let server_name = ServerName::try_from(host.to_string())?;
                let tls = connector.connect(server_name, tcp).await?;
                Ok(Self::Tls(Box::new(tls)))
            }
            Self::Tls(_) => Err(Error::InvalidState("stream is already TLS".to_string())),
        }
    }

    /// Returns `true` if the stream is TLS-encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }
}

impl AsyncRead for MailStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for MailStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

/// Builds a [`TlsConnector`] backed by the Mozilla root store shipped in
/// `webpki-roots`, avoiding a dependency on the platform certificate store.
pub fn create_tls_connector() -> Result<TlsConnector> {
    let root_store = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(config)))
}

/// Opens a [`MailStream`] for `endpoint`, performing DNS resolution, an
/// optional SOCKS4/5 tunnel, and an optional immediate TLS handshake, in
/// that order. `STARTTLS`-style upgrades happen later, via
/// [`MailStream::upgrade_to_tls`], once the protocol client has seen the
/// server's capability/greeting banner.
///
/// Candidate addresses are tried in the order the resolver returned them;
/// the first to accept a TCP connection wins. If every candidate fails,
/// the last connect error is returned.
///
/// # Errors
///
/// Returns [`Error::Lookup`] if DNS resolution fails, [`Error::Connect`]
/// if every resolved address refuses the connection, [`Error::Socks`] if
/// proxy negotiation fails, or a TLS error if an immediate handshake
/// fails.
pub async fn connect(endpoint: &Endpoint) -> Result<MailStream> {
    let (dial_host, dial_port) = match &endpoint.socks {
        Some(proxy) => (proxy.host.as_str(), proxy.port),
        None => (endpoint.host.as_str(), endpoint.port),
    };

    let addrs = resolver::resolve(
        dial_host,
        dial_port,
        endpoint.resolver,
        endpoint.connect_timeout,
    )
    .await?;

    let mut tcp = None;
    let mut last_err = None;
    for addr in &addrs {
        match tokio::time::timeout(endpoint.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                tcp = Some(stream);
                break;
            }
            Ok(Err(e)) => last_err = Some(e.to_string()),
            Err(_) => last_err = Some("connect timed out".to_string()),
        }
    }
    let mut tcp = tcp.ok_or_else(|| {
        Error::Connect(last_err.unwrap_or_else(|| "no addresses to try".to_string()))
    })?;

    if let Some(proxy) = &endpoint.socks {
        let creds = match (&proxy.username, &proxy.password) {
            (Some(u), Some(p)) => Some((u.as_str(), p.as_str())),
            _ => None,
        };
        match proxy.kind {
            SocksType::Socks4 => {
                let ip = match endpoint.host.parse::<std::net::Ipv4Addr>() {
                    Ok(ip) => ip,
                    Err(_) => {
                        let resolved = resolver::resolve(
                            &endpoint.host,
                            endpoint.port,
                            endpoint.resolver,
                            endpoint.connect_timeout,
                        )
                        .await?;
                        resolved
                            .into_iter()
                            .find_map(|a| match a.ip() {
                                std::net::IpAddr::V4(v4) => Some(v4),
                                std::net::IpAddr::V6(_) => None,
                            })
                            .ok_or_else(|| {
                                Error::Socks("SOCKS4 requires an IPv4 target address".to_string())
                            })?
                    }
                };
                socks::socks4_connect(&mut tcp, ip, endpoint.port).await?;
            }
            SocksType::Socks5 => {
                socks::socks5_connect(&mut tcp, &endpoint.host, endpoint.port, creds).await?;
            }
        }
    }

    match endpoint.tls {
        TlsMode::Tunnel => {
            let connector = create_tls_connector()?;
            let server_name = ServerName::try_from(endpoint.host.clone())?;
            let tls = connector.connect(server_name, tcp).await?;
            Ok(MailStream::Tls(Box::new(tls)))
        }
        TlsMode::None | TlsMode::StartTls => Ok(MailStream::Plain(tcp)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn tls_connector_builds() {
        assert!(create_tls_connector().is_ok());
    }
}
