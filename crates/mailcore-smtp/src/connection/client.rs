//! Type-state SMTP client.

use super::{ServerInfo, SmtpStream};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{is_last_reply_line, parse_reply};
use crate::types::{Address, AuthMechanism, Extension, Reply, ReplyCode};
use base64::Engine;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::time::{Duration, Instant};

/// Minimum spacing between progressive-send callback invocations during
/// `DATA` (spec §4.5: "bounded to one notification per configured
/// interval"), mirroring `mailcore_imap::connection::worker`'s throttle.
pub const SEND_PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

/// Type-state marker for connected state.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker for authenticated state.
#[derive(Debug)]
pub struct Authenticated;

/// Type-state marker for mail transaction started.
#[derive(Debug)]
pub struct MailTransaction;

/// Type-state marker for recipient added.
#[derive(Debug)]
pub struct RecipientAdded;

/// Type-state marker for data mode.
#[derive(Debug)]
pub struct Data;

/// SMTP client with type-state pattern.
#[derive(Debug)]
pub struct Client<State> {
    stream: SmtpStream,
    server_info: ServerInfo,
    _state: PhantomData<State>,
}

/// Connection trait for all states.
pub trait SmtpConnection {
    /// Returns the server information.
    fn server_info(&self) -> &ServerInfo;
}

impl<S> SmtpConnection for Client<S> {
    fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }
}

impl Client<Connected> {
    /// Creates a client from a stream and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or if the server returns an error.
    pub async fn from_stream(mut stream: SmtpStream) -> Result<Self> {
        let greeting = Self::read_reply(&mut stream).await?;
        if !greeting.is_success() {
            return Err(Error::smtp_error(
                greeting.code.as_u16(),
                greeting.message_text(),
            ));
        }

        // Extract hostname from greeting (first word after code)
        let hostname = greeting
            .message
            .first()
            .and_then(|msg| msg.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();

        Ok(Self {
            stream,
            server_info: ServerInfo {
                hostname,
                extensions: HashSet::new(),
            },
            _state: PhantomData,
        })
    }

    /// Sends EHLO and discovers server capabilities.
    ///
    /// # Errors
    ///
    /// Returns an error if the EHLO command fails.
    pub async fn ehlo(mut self, client_hostname: &str) -> Result<Self> {
        let cmd = Command::Ehlo {
            hostname: client_hostname.to_string(),
        };
        let reply = self.send_command(cmd).await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        // Parse extensions from EHLO response (skip first line which is greeting)
        let mut extensions = HashSet::new();
        for line in reply.message.iter().skip(1) {
            extensions.insert(Extension::parse(line));
        }

        self.server_info.extensions = extensions;
        Ok(self)
    }

    /// Upgrades the connection to TLS using STARTTLS.
    ///
    /// # Errors
    ///
    /// Returns an error if STARTTLS is not supported or if the upgrade fails.
    pub async fn starttls(mut self, hostname: &str) -> Result<Self> {
        if !self.server_info.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS".into()));
        }

        let cmd = Command::StartTls;
        let reply = self.send_command(cmd).await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        // Upgrade stream to TLS
        self.stream = self.stream.upgrade_to_tls(hostname).await?;

        // Send EHLO again after STARTTLS
        let cmd = Command::Ehlo {
            hostname: hostname.to_string(),
        };
        let reply = self.send_command(cmd).await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        // Re-parse extensions
        let mut extensions = HashSet::new();
        for line in reply.message.iter().skip(1) {
            extensions.insert(Extension::parse(line));
        }
        self.server_info.extensions = extensions;

        Ok(self)
    }

    /// Authenticates using PLAIN mechanism.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_plain(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        // Build PLAIN response: \0username\0password
        let credentials = format!("\0{username}\0{password}");
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes());

        let cmd = Command::Auth {
            mechanism: AuthMechanism::Plain,
            initial_response: Some(encoded),
        };

        let reply = self.send_command(cmd).await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        })
    }

    /// Authenticates using the LOGIN mechanism: `AUTH LOGIN` followed by
    /// two base64 continuation lines (username, then password), each
    /// prompted by a `334` reply.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        let cmd = Command::Auth {
            mechanism: AuthMechanism::Login,
            initial_response: None,
        };
        let reply = self.send_command(cmd).await?;
        if reply.code != ReplyCode::AUTH_CONTINUE {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        let user_b64 = base64::engine::general_purpose::STANDARD.encode(username);
        self.stream.write_all(user_b64.as_bytes()).await?;
        self.stream.write_all(b"\r\n").await?;
        let reply = Self::read_reply(&mut self.stream).await?;
        if reply.code != ReplyCode::AUTH_CONTINUE {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        let pass_b64 = base64::engine::general_purpose::STANDARD.encode(password);
        self.stream.write_all(pass_b64.as_bytes()).await?;
        self.stream.write_all(b"\r\n").await?;
        let reply = Self::read_reply(&mut self.stream).await?;
        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        })
    }

    /// Authenticates using CRAM-MD5: `AUTH CRAM-MD5`, then an HMAC-MD5
    /// response computed over the server's base64 challenge.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_cram_md5(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        let cmd = Command::Auth {
            mechanism: AuthMechanism::CramMd5,
            initial_response: None,
        };
        let reply = self.send_command(cmd).await?;
        if reply.code != ReplyCode::AUTH_CONTINUE {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }
        let challenge = reply.message_text();

        let response = mailcore_codec::hmac_md5::respond(&challenge, username, password)
            .map_err(|e| Error::Protocol(format!("CRAM-MD5: {e}")))?;
        self.stream.write_all(response.as_bytes()).await?;
        self.stream.write_all(b"\r\n").await?;
        let reply = Self::read_reply(&mut self.stream).await?;
        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        })
    }

    /// Authenticates using the strongest mechanism the server advertised
    /// and this crate can drive (`CRAM-MD5 > PLAIN > LOGIN`, spec §4.5),
    /// or a caller-forced mechanism.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] if the server advertised none of
    /// `CRAM-MD5`, `PLAIN`, or `LOGIN`, or if authentication itself fails.
    pub async fn authenticate(
        self,
        username: &str,
        password: &str,
        forced: Option<AuthMechanism>,
    ) -> Result<Client<Authenticated>> {
        let mechanism = forced
            .or_else(|| self.server_info.preferred_auth_mechanism())
            .ok_or_else(|| Error::NotSupported("AUTH (no usable mechanism advertised)".into()))?;

        match mechanism {
            AuthMechanism::CramMd5 => self.auth_cram_md5(username, password).await,
            AuthMechanism::Plain => self.auth_plain(username, password).await,
            AuthMechanism::Login => self.auth_login(username, password).await,
            other => Err(Error::NotSupported(format!(
                "AUTH {} (not implemented)",
                other.as_str()
            ))),
        }
    }

    /// Starts a mail transaction without authentication (if server allows).
    ///
    /// # Errors
    ///
    /// Returns an error if the MAIL FROM command fails.
    pub async fn mail_from(mut self, from: Address) -> Result<Client<MailTransaction>> {
        let cmd = Command::MailFrom {
            from,
            body: None,
            size: None,
        };
        let reply = self.send_command(cmd).await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        })
    }
}

impl Client<Authenticated> {
    /// Starts a mail transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the MAIL FROM command fails.
    pub async fn mail_from(mut self, from: Address) -> Result<Client<MailTransaction>> {
        let cmd = Command::MailFrom {
            from,
            body: None,
            size: None,
        };
        let reply = self.send_command(cmd).await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        })
    }
}

impl Client<MailTransaction> {
    /// Adds a recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Client<RecipientAdded>> {
        let cmd = Command::RcptTo { to };
        let reply = self.send_command(cmd).await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        })
    }

    /// Resets the transaction and returns to authenticated/connected state.
    ///
    /// # Errors
    ///
    /// Returns an error if the RSET command fails.
    pub async fn reset(mut self) -> Result<Client<Connected>> {
        let cmd = Command::Rset;
        let reply = self.send_command(cmd).await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        })
    }
}

impl Client<RecipientAdded> {
    /// Adds another recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Self> {
        let cmd = Command::RcptTo { to };
        let reply = self.send_command(cmd).await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(self)
    }

    /// Begins sending message data.
    ///
    /// # Errors
    ///
    /// Returns an error if the DATA command fails.
    pub async fn data(mut self) -> Result<Client<Data>> {
        let cmd = Command::Data;
        let reply = self.send_command(cmd).await?;

        if reply.code != ReplyCode::START_DATA {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        })
    }

    /// Resets the transaction and returns to connected state.
    ///
    /// # Errors
    ///
    /// Returns an error if the RSET command fails.
    pub async fn reset(mut self) -> Result<Client<Connected>> {
        let cmd = Command::Rset;
        let reply = self.send_command(cmd).await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        })
    }
}

impl Client<Data> {
    /// Sends the message content and completes the transaction.
    ///
    /// Message should be RFC 5322 formatted. Line endings will be normalized to CRLF.
    /// The terminating "." line will be added automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if sending the message fails or server rejects it.
    pub async fn send_message(self, message: &[u8]) -> Result<Client<Connected>> {
        self.send_message_with_progress(message, |_, _| {}).await
    }

    /// Sends the message content, invoking `on_progress(cur_bytes,
    /// total_bytes)` as the body streams out (spec §4.5's progressive-send
    /// callback), throttled to at most one call per
    /// [`SEND_PROGRESS_INTERVAL`] plus a final call with `cur == total`.
    ///
    /// # Errors
    ///
    /// Returns an error if sending the message fails or server rejects it.
    pub async fn send_message_with_progress(
        mut self,
        message: &[u8],
        mut on_progress: impl FnMut(u64, u64),
    ) -> Result<Client<Connected>> {
        let total = message.len() as u64;
        let mut sent: u64 = 0;
        let mut last_report = Instant::now() - SEND_PROGRESS_INTERVAL;

        // Send message with proper line ending normalization
        // and byte-stuffing (leading dots)
        for line in message.split(|&b| b == b'\n') {
            let line_with_nl_len = line.len() as u64 + 1;
            let line = if !line.is_empty() && line[line.len() - 1] == b'\r' {
                &line[..line.len() - 1]
            } else {
                line
            };

            // Byte-stuff lines starting with '.'
            if !line.is_empty() && line[0] == b'.' {
                self.stream.write_all(b".").await?;
            }

            self.stream.write_all(line).await?;
            self.stream.write_all(b"\r\n").await?;

            sent = (sent + line_with_nl_len).min(total);
            if last_report.elapsed() >= SEND_PROGRESS_INTERVAL {
                on_progress(sent, total);
                last_report = Instant::now();
            }
        }

        // Send terminating sequence
        self.stream.write_all(b".\r\n").await?;
        on_progress(total, total);

        // Read server response
        let reply = Self::read_reply(&mut self.stream).await?;

        if !reply.is_success() {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        })
    }
}

// Common implementation for all states
impl<S> Client<S> {
    async fn send_command(&mut self, cmd: Command) -> Result<Reply> {
        let data = cmd.serialize();
        self.stream.write_all(&data).await?;
        Self::read_reply(&mut self.stream).await
    }

    async fn read_reply(stream: &mut SmtpStream) -> Result<Reply> {
        let mut lines = Vec::new();
        loop {
            let line = stream.read_line().await?;
            if line.is_empty() {
                continue;
            }

            let is_last = is_last_reply_line(&line);
            lines.push(line);

            if is_last {
                break;
            }
        }

        parse_reply(&lines)
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// A failure here never fails the send: the message has already been
    /// accepted by the server, so a rejected or timed-out QUIT is logged
    /// and swallowed rather than returned.
    pub async fn quit(mut self) -> Result<()> {
        let cmd = Command::Quit;
        match self.send_command(cmd).await {
            Ok(reply) if !reply.is_success() && reply.code != ReplyCode::CLOSING => {
                tracing::warn!(code = reply.code.as_u16(), "QUIT rejected by server");
            }
            Err(err) => {
                tracing::warn!(%err, "QUIT failed");
            }
            Ok(_) => {}
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
    use tokio::net::{TcpListener, TcpStream};

    fn data_client(stream: SmtpStream) -> Client<Data> {
        Client {
            stream,
            server_info: ServerInfo {
                hostname: "mx.example.com".to_string(),
                extensions: HashSet::new(),
            },
            _state: PhantomData,
        }
    }

    /// Spec §8 scenario 5: progress callback sees monotonically increasing
    /// `(cur, total)` and `cur == total == len(body)` at completion.
    #[tokio::test]
    async fn send_message_reports_monotonic_progress_to_completion() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            loop {
                let mut chunk = [0u8; 256];
                let n = sock.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
                if buf.ends_with(b"\r\n.\r\n") {
                    break;
                }
            }
            sock.write_all(b"250 OK\r\n").await.unwrap();
            buf
        });

        let tcp = TcpStream::connect(addr).await.unwrap();
        let client = data_client(SmtpStream::new(mailcore_transport::MailStream::plain(tcp)));

        let body = b"Subject: hi\r\n\r\nHello, world, this is the body text.\r\n";
        let mut progress = Vec::new();
        let result = client
            .send_message_with_progress(body, |cur, total| progress.push((cur, total)))
            .await;
        assert!(result.is_ok());

        let received = server.await.unwrap();
        assert!(received.starts_with(b"Subject: hi"));

        assert!(!progress.is_empty());
        let total = body.len() as u64;
        for pair in progress.windows(2) {
            assert!(pair[1].0 >= pair[0].0, "progress must not go backwards");
        }
        let (last_cur, last_total) = *progress.last().unwrap();
        assert_eq!(last_cur, total);
        assert_eq!(last_total, total);
        assert!(progress.iter().all(|&(_, t)| t == total));
    }

    #[tokio::test]
    async fn send_message_dot_stuffs_leading_dot_lines() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            loop {
                let mut chunk = [0u8; 256];
                let n = sock.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
                if buf.ends_with(b"\r\n.\r\n") {
                    break;
                }
            }
            sock.write_all(b"250 OK\r\n").await.unwrap();
            buf
        });

        let tcp = TcpStream::connect(addr).await.unwrap();
        let client = data_client(SmtpStream::new(mailcore_transport::MailStream::plain(tcp)));

        let body = b".leading dot\r\nordinary line\r\n";
        let result = client.send_message(body).await;
        assert!(result.is_ok());

        let received = server.await.unwrap();
        assert!(received.starts_with(b"..leading dot\r\n"));
    }

    fn connected_client(stream: SmtpStream, mechanisms: &[AuthMechanism]) -> Client<Connected> {
        Client {
            stream,
            server_info: ServerInfo {
                hostname: "mx.example.com".to_string(),
                extensions: HashSet::from([Extension::Auth(mechanisms.to_vec())]),
            },
            _state: PhantomData,
        }
    }

    async fn read_request_line(sock: &mut TcpStream) -> String {
        let mut buf = [0u8; 512];
        let n = sock.read(&mut buf).await.unwrap();
        String::from_utf8_lossy(&buf[..n]).trim_end().to_string()
    }

    /// Spec §8 scenario 1 (adapted for SMTP): `AUTH CRAM-MD5` base64
    /// challenge round-trip produces the HMAC-MD5 response.
    #[tokio::test]
    async fn auth_cram_md5_sends_hmac_response() {
        use base64::Engine as _;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let request = read_request_line(&mut sock).await;
            assert_eq!(request, "AUTH CRAM-MD5");

            let challenge =
                base64::engine::general_purpose::STANDARD.encode("<1234@host>");
            sock.write_all(format!("334 {challenge}\r\n").as_bytes())
                .await
                .unwrap();

            let response = read_request_line(&mut sock).await;
            let decoded = base64::engine::general_purpose::STANDARD
                .decode(response)
                .unwrap();
            let decoded = String::from_utf8(decoded).unwrap();
            assert!(decoded.starts_with("alice "));
            sock.write_all(b"235 Authentication successful\r\n")
                .await
                .unwrap();
        });

        let tcp = TcpStream::connect(addr).await.unwrap();
        let client = connected_client(
            SmtpStream::new(mailcore_transport::MailStream::plain(tcp)),
            &[AuthMechanism::CramMd5],
        );

        let result = client.auth_cram_md5("alice", "secret").await;
        assert!(result.is_ok());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn auth_login_sends_base64_username_then_password() {
        use base64::Engine as _;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            assert_eq!(read_request_line(&mut sock).await, "AUTH LOGIN");
            sock.write_all(b"334 VXNlcm5hbWU6\r\n").await.unwrap();

            let user = read_request_line(&mut sock).await;
            let decoded = base64::engine::general_purpose::STANDARD
                .decode(user)
                .unwrap();
            assert_eq!(String::from_utf8(decoded).unwrap(), "alice");
            sock.write_all(b"334 UGFzc3dvcmQ6\r\n").await.unwrap();

            let pass = read_request_line(&mut sock).await;
            let decoded = base64::engine::general_purpose::STANDARD
                .decode(pass)
                .unwrap();
            assert_eq!(String::from_utf8(decoded).unwrap(), "secret");
            sock.write_all(b"235 Authentication successful\r\n")
                .await
                .unwrap();
        });

        let tcp = TcpStream::connect(addr).await.unwrap();
        let client = connected_client(
            SmtpStream::new(mailcore_transport::MailStream::plain(tcp)),
            &[AuthMechanism::Login],
        );

        let result = client.auth_login("alice", "secret").await;
        assert!(result.is_ok());
        server.await.unwrap();
    }

    #[test]
    fn preferred_auth_mechanism_prefers_cram_md5_over_plain_and_login() {
        let info = ServerInfo {
            hostname: "mx.example.com".to_string(),
            extensions: HashSet::from([Extension::Auth(vec![
                AuthMechanism::Login,
                AuthMechanism::Plain,
                AuthMechanism::CramMd5,
            ])]),
        };
        assert_eq!(
            info.preferred_auth_mechanism(),
            Some(AuthMechanism::CramMd5)
        );
    }

    #[test]
    fn preferred_auth_mechanism_ignores_digest_md5() {
        let info = ServerInfo {
            hostname: "mx.example.com".to_string(),
            extensions: HashSet::from([Extension::Auth(vec![
                AuthMechanism::DigestMd5,
                AuthMechanism::Plain,
            ])]),
        };
        assert_eq!(info.preferred_auth_mechanism(), Some(AuthMechanism::Plain));
    }

    #[test]
    fn preferred_auth_mechanism_none_when_nothing_usable() {
        let info = ServerInfo {
            hostname: "mx.example.com".to_string(),
            extensions: HashSet::from([Extension::Auth(vec![AuthMechanism::DigestMd5])]),
        };
        assert_eq!(info.preferred_auth_mechanism(), None);
    }
}
