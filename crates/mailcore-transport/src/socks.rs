//! SOCKS4 and SOCKS5 client-side handshakes (spec §4.1 component 3).
//!
//! Both functions wrap an already-connected [`tokio::net::TcpStream`] and
//! negotiate a proxied connection to `target_host:target_port` before any
//! application bytes flow, matching `socks_connect`'s dispatch in the
//! original `libsylph/socks.c`.

use std::net::{IpAddr, Ipv4Addr};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{Error, Result};

/// Performs the SOCKS4 CONNECT handshake.
///
/// SOCKS4 has no authentication and only supports IPv4 targets; the target
/// host is resolved locally (by the caller) to a single [`Ipv4Addr`] before
/// calling this function, matching `socks4_connect`'s `gethostbyname` step.
///
/// # Errors
///
/// Returns [`Error::Socks`] if the proxy rejects the request or responds
/// with a malformed reply, or [`Error::Io`] on transport failure.
pub async fn socks4_connect(
    stream: &mut TcpStream,
    target: Ipv4Addr,
    target_port: u16,
) -> Result<()> {
    let mut request = Vec::with_capacity(9);
    request.push(4); // SOCKS version
    request.push(1); // CONNECT command
    request.extend_from_slice(&target_port.to_be_bytes());
    request.extend_from_slice(&target.octets());
    request.push(0); // empty user-id, NUL-terminated

    stream.write_all(&request).await?;

    let mut reply = [0u8; 8];
    stream.read_exact(&mut reply).await?;

    if reply[0] != 0 {
        return Err(Error::Socks(format!(
            "malformed SOCKS4 reply (version byte {})",
            reply[0]
        )));
    }
    match reply[1] {
        90 => Ok(()),
        91 => Err(Error::Socks("SOCKS4 request rejected or failed".into())),
        92 => Err(Error::Socks(
            "SOCKS4 request failed: client is not running identd".into(),
        )),
        93 => Err(Error::Socks(
            "SOCKS4 request failed: identd could not confirm user-id".into(),
        )),
        code => Err(Error::Socks(format!("unknown SOCKS4 reply code {code}"))),
    }
}

/// Performs the SOCKS5 CONNECT handshake, including username/password
/// sub-negotiation (RFC 1929) when credentials are supplied.
///
/// # Errors
///
/// Returns [`Error::Socks`] if negotiation, authentication, or the connect
/// request fails, or [`Error::Io`] on transport failure.
pub async fn socks5_connect(
    stream: &mut TcpStream,
    target_host: &str,
    target_port: u16,
    credentials: Option<(&str, &str)>,
) -> Result<()> {
    negotiate_method(stream, credentials.is_some()).await?;

    if let Some((user, pass)) = credentials {
        authenticate(stream, user, pass).await?;
    }

    request_connect(stream, target_host, target_port).await
}

async fn negotiate_method(stream: &mut TcpStream, want_auth: bool) -> Result<()> {
    let methods: &[u8] = if want_auth { &[0x00, 0x02] } else { &[0x00] };
    let mut request = vec![5u8, u8::try_from(methods.len()).unwrap_or(1)];
    request.extend_from_slice(methods);
    stream.write_all(&request).await?;

    let mut reply = [0u8; 2];
    stream.read_exact(&mut reply).await?;
    if reply[0] != 5 {
        return Err(Error::Socks("proxy did not speak SOCKS5".into()));
    }
    match reply[1] {
        0x00 => Ok(()),
        0x02 if want_auth => Ok(()),
        0xff => Err(Error::Socks(
            "no acceptable SOCKS5 authentication method".into(),
        )),
        method => Err(Error::Socks(format!(
            "SOCKS5 proxy selected unexpected method {method}"
        ))),
    }
}

async fn authenticate(stream: &mut TcpStream, user: &str, pass: &str) -> Result<()> {
    if user.len() > 255 || pass.len() > 255 {
        return Err(Error::Socks(
            "SOCKS5 username/password must each be <= 255 bytes".into(),
        ));
    }

    let mut request = Vec::with_capacity(3 + user.len() + pass.len());
    request.push(1); // sub-negotiation version
    request.push(u8::try_from(user.len()).unwrap_or(0));
    request.extend_from_slice(user.as_bytes());
    request.push(u8::try_from(pass.len()).unwrap_or(0));
    request.extend_from_slice(pass.as_bytes());
    stream.write_all(&request).await?;

    let mut reply = [0u8; 2];
    stream.read_exact(&mut reply).await?;
    if reply[1] != 0 {
        return Err(Error::Socks("SOCKS5 authentication rejected".into()));
    }
    Ok(())
}

async fn request_connect(stream: &mut TcpStream, host: &str, port: u16) -> Result<()> {
    let mut request = vec![5u8, 1, 0]; // version, CONNECT, reserved

    if let Ok(ip) = host.parse::<IpAddr>() {
        match ip {
            IpAddr::V4(v4) => {
                request.push(1);
                request.extend_from_slice(&v4.octets());
            }
            IpAddr::V6(v6) => {
                request.push(4);
                request.extend_from_slice(&v6.octets());
            }
        }
    } else {
        if host.len() > 255 {
            return Err(Error::Socks("hostname too long for SOCKS5".into()));
        }
        request.push(3); // domain name
        request.push(u8::try_from(host.len()).unwrap_or(0));
        request.extend_from_slice(host.as_bytes());
    }
    request.extend_from_slice(&port.to_be_bytes());

    stream.write_all(&request).await?;

    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await?;
    if header[0] != 5 {
        return Err(Error::Socks("malformed SOCKS5 connect reply".into()));
    }
    if header[1] != 0 {
        return Err(Error::Socks(format!(
            "SOCKS5 connect failed with reply code {}",
            header[1]
        )));
    }

    // Drain the bound address the proxy reports; we don't need it.
    match header[3] {
        1 => {
            let mut rest = [0u8; 4 + 2];
            stream.read_exact(&mut rest).await?;
        }
        4 => {
            let mut rest = [0u8; 16 + 2];
            stream.read_exact(&mut rest).await?;
        }
        3 => {
            let mut len = [0u8; 1];
            stream.read_exact(&mut len).await?;
            let mut rest = vec![0u8; usize::from(len[0]) + 2];
            stream.read_exact(&mut rest).await?;
        }
        atyp => return Err(Error::Socks(format!("unknown SOCKS5 address type {atyp}"))),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt as _;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn socks4_success_reply_is_accepted() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 9];
            tokio::io::AsyncReadExt::read_exact(&mut sock, &mut buf)
                .await
                .unwrap();
            sock.write_all(&[0, 90, 0, 0, 0, 0, 0, 0]).await.unwrap();
        });

        let mut client = TcpStream::connect(addr).await.unwrap();
        let result = socks4_connect(&mut client, Ipv4Addr::new(10, 0, 0, 1), 25).await;
        server.await.unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn socks4_rejection_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 9];
            tokio::io::AsyncReadExt::read_exact(&mut sock, &mut buf)
                .await
                .unwrap();
            sock.write_all(&[0, 91, 0, 0, 0, 0, 0, 0]).await.unwrap();
        });

        let mut client = TcpStream::connect(addr).await.unwrap();
        let result = socks4_connect(&mut client, Ipv4Addr::new(10, 0, 0, 1), 25).await;
        server.await.unwrap();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn socks5_no_auth_connect_succeeds() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut greeting = [0u8; 2];
            tokio::io::AsyncReadExt::read_exact(&mut sock, &mut greeting)
                .await
                .unwrap();
            sock.write_all(&[5, 0]).await.unwrap();

            // CONNECT request with domain name target.
            let mut head = [0u8; 4];
            tokio::io::AsyncReadExt::read_exact(&mut sock, &mut head)
                .await
                .unwrap();
            assert_eq!(head, [5, 1, 0, 3]);
            let mut len = [0u8; 1];
            tokio::io::AsyncReadExt::read_exact(&mut sock, &mut len)
                .await
                .unwrap();
            let mut rest = vec![0u8; usize::from(len[0]) + 2];
            tokio::io::AsyncReadExt::read_exact(&mut sock, &mut rest)
                .await
                .unwrap();

            sock.write_all(&[5, 0, 0, 1, 0, 0, 0, 0, 0, 0])
                .await
                .unwrap();
        });

        let mut client = TcpStream::connect(addr).await.unwrap();
        let result = socks5_connect(&mut client, "imap.example.com", 993, None).await;
        server.await.unwrap();
        assert!(result.is_ok());
    }
}
