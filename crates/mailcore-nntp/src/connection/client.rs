//! NNTP session client: selected-group state, overview/header fetch,
//! posting, and deferred `AUTHINFO` (spec §4.4).

use mailcore_transport::Endpoint;

use super::stream::NntpStream;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::parse_reply;
use crate::types::{GroupInfo, OverviewLine, Reply, ReplyCode};

/// Credentials used for a deferred `AUTHINFO USER`/`AUTHINFO PASS`
/// exchange, triggered the first time a command is rejected with `480`.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// NNTP username.
    pub username: String,
    /// NNTP password.
    pub password: String,
}

/// An NNTP client connection (spec §3.4 `NNTPSession`).
pub struct Client {
    stream: NntpStream,
    host: String,
    /// Currently selected newsgroup, if any.
    selected_group: Option<GroupInfo>,
    credentials: Option<Credentials>,
    /// Set once a retried command after `AUTHINFO` still fails; further
    /// auth attempts are not retried automatically.
    auth_failed: bool,
    posting_allowed: bool,
}

impl Client {
    /// Connects to `endpoint` and reads the server greeting (`200`/`201`).
    ///
    /// # Errors
    ///
    /// Returns a transport error if the connection fails, or
    /// [`Error::Nntp`] if the greeting is not `200`/`201`.
    pub async fn connect(endpoint: &Endpoint, credentials: Option<Credentials>) -> Result<Self> {
        let mail_stream = mailcore_transport::connect(endpoint).await?;
        let mut client = Self {
            stream: NntpStream::new(mail_stream),
            host: endpoint.host.clone(),
            selected_group: None,
            credentials,
            auth_failed: false,
            posting_allowed: false,
        };

        let greeting = client.stream.read_line().await?;
        let reply = parse_reply(&greeting)?;
        match reply.code {
            ReplyCode::POSTING_ALLOWED => client.posting_allowed = true,
            ReplyCode::POSTING_PROHIBITED => client.posting_allowed = false,
            other => return Err(Error::reply(other.as_u16(), reply.text)),
        }

        Ok(client)
    }

    /// The newsgroup currently selected via `GROUP`, if any.
    #[must_use]
    pub const fn selected_group(&self) -> Option<&GroupInfo> {
        self.selected_group.as_ref()
    }

    /// Whether a prior deferred `AUTHINFO` retry has already failed once;
    /// no further automatic retries will be attempted.
    #[must_use]
    pub const fn auth_failed(&self) -> bool {
        self.auth_failed
    }

    /// Whether the server's greeting advertised that posting is allowed.
    #[must_use]
    pub const fn posting_allowed(&self) -> bool {
        self.posting_allowed
    }

    /// Upgrades the connection to TLS via `STARTTLS`-style negotiation,
    /// after the caller has already completed whatever command exchange
    /// the server requires to request it (spec §4.1 component 4).
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is already TLS or the handshake
    /// fails.
    pub async fn upgrade_to_tls(self) -> Result<Self> {
        let host = self.host.clone();
        Ok(Self {
            stream: self.stream.upgrade_to_tls(&host).await?,
            ..self
        })
    }

    /// `MODE READER`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Nntp`] if the server rejects the command.
    pub async fn mode_reader(&mut self) -> Result<()> {
        let reply = self.send(Command::ModeReader).await?;
        if reply.code.is_success() {
            Ok(())
        } else {
            Err(Error::reply(reply.code.as_u16(), reply.text))
        }
    }

    /// `GROUP <name>`, skipped when `name` is already the selected group
    /// and `need_counts` is false (spec §4.4).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Nntp`] (411 no such group, etc.) on failure.
    pub async fn group(&mut self, name: &str, need_counts: bool) -> Result<GroupInfo> {
        if !need_counts {
            if let Some(current) = &self.selected_group {
                if current.name == name {
                    return Ok(current.clone());
                }
            }
        }

        let reply = self.send(Command::Group(name.to_string())).await?;
        if reply.code != ReplyCode::GROUP_SELECTED {
            return Err(Error::reply(reply.code.as_u16(), reply.text));
        }
        let info = GroupInfo::parse(&reply.text)?;
        self.selected_group = Some(info.clone());
        Ok(info)
    }

    /// `ARTICLE <spec>`: returns the full article (headers + body) as
    /// lines, dot-unstuffed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Nntp`] if the article is not found.
    pub async fn article(&mut self, spec: Option<&str>) -> Result<Vec<String>> {
        self.fetch_multiline(Command::Article(spec.map(str::to_string)), ReplyCode::ARTICLE_FOLLOWS)
            .await
    }

    /// `HEAD <spec>`: returns only the header lines.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Nntp`] if the article is not found.
    pub async fn head(&mut self, spec: Option<&str>) -> Result<Vec<String>> {
        self.fetch_multiline(Command::Head(spec.map(str::to_string)), ReplyCode::HEAD_FOLLOWS)
            .await
    }

    /// `BODY <spec>`: returns only the body lines.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Nntp`] if the article is not found.
    pub async fn body(&mut self, spec: Option<&str>) -> Result<Vec<String>> {
        self.fetch_multiline(Command::Body(spec.map(str::to_string)), ReplyCode::BODY_FOLLOWS)
            .await
    }

    /// `STAT <spec>`: confirms the article exists without transferring
    /// it; returns the `(number, message-id)` pair from the status line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Nntp`] if the article is not found.
    pub async fn stat(&mut self, spec: Option<&str>) -> Result<(u64, String)> {
        let reply = self.send(Command::Stat(spec.map(str::to_string))).await?;
        parse_number_and_msgid(&reply, ReplyCode::ARTICLE_SELECTED)
    }

    /// `NEXT`: advances to the next article in the group and returns its
    /// `(number, message-id)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Nntp`] (421) if there is no next article.
    pub async fn next(&mut self) -> Result<(u64, String)> {
        let reply = self.send(Command::Next).await?;
        parse_number_and_msgid(&reply, ReplyCode::ARTICLE_SELECTED)
    }

    /// `XOVER <first>-<last>`: streams and parses overview lines until
    /// the terminating lone `.`. Malformed individual lines are skipped
    /// with a logged warning rather than failing the whole fetch (spec
    /// §7 "low-level parser warnings ... are logged but not surfaced").
    ///
    /// # Errors
    ///
    /// Returns [`Error::Nntp`] if the server rejects the command outright.
    pub async fn xover(&mut self, first: u64, last: u64) -> Result<Vec<OverviewLine>> {
        let reply = self.send(Command::XOver(first, last)).await?;
        if reply.code != ReplyCode::OVERVIEW_FOLLOWS {
            return Err(Error::reply(reply.code.as_u16(), reply.text));
        }
        let lines = self.stream.read_dotted_block().await?;
        Ok(lines
            .iter()
            .filter_map(|line| match OverviewLine::parse(line) {
                Ok(ov) => Some(ov),
                Err(e) => {
                    tracing::warn!(line = %line, error = %e, "skipping malformed XOVER line");
                    None
                }
            })
            .collect())
    }

    /// `XHDR <field> <first>-<last>`: returns `(article number, value)`
    /// pairs, tab-delimited per line. Spec §4.4 calls for this to be
    /// issued once per field (typically `to` and `cc`), aligned
    /// positionally with the `XOVER` list by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Nntp`] if the server rejects the command outright.
    pub async fn xhdr(&mut self, field: &str, first: u64, last: u64) -> Result<Vec<(u64, String)>> {
        let reply = self
            .send(Command::XHdr(field.to_string(), first, last))
            .await?;
        if reply.code != ReplyCode::HEADERS_FOLLOW {
            return Err(Error::reply(reply.code.as_u16(), reply.text));
        }
        let lines = self.stream.read_dotted_block().await?;
        Ok(lines
            .iter()
            .filter_map(|line| {
                let (num, value) = line.split_once(' ')?;
                num.parse().ok().map(|n| (n, value.to_string()))
            })
            .collect())
    }

    /// `LIST`: returns the raw newsgroup-list lines, unparsed (each line
    /// is `<name> <last> <first> <posting-flag>`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Nntp`] if the server rejects the command.
    pub async fn list(&mut self) -> Result<Vec<String>> {
        let reply = self.send(Command::List).await?;
        if reply.code != ReplyCode::LIST_FOLLOWS {
            return Err(Error::reply(reply.code.as_u16(), reply.text));
        }
        self.stream.read_dotted_block().await
    }

    /// `POST`: waits for `340`, streams the dot-stuffed article body,
    /// sends the terminating `.\r\n`, and expects `240`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Nntp`] if posting is rejected or fails.
    pub async fn post(&mut self, article: &[u8]) -> Result<()> {
        let reply = self.send(Command::Post).await?;
        if reply.code != ReplyCode::POST_CONTINUE {
            return Err(Error::reply(reply.code.as_u16(), reply.text));
        }

        for line in article.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            let mut out = Vec::with_capacity(line.len() + 2);
            if line.first() == Some(&b'.') {
                out.push(b'.');
            }
            out.extend_from_slice(line);
            out.extend_from_slice(b"\r\n");
            self.stream.write_raw(&out).await?;
        }
        self.stream.write_raw(b".\r\n").await?;

        let line = self.stream.read_line().await?;
        let reply = parse_reply(&line)?;
        if reply.code == ReplyCode::POST_OK || reply.code == ReplyCode::TRANSFER_OK {
            Ok(())
        } else {
            Err(Error::reply(reply.code.as_u16(), reply.text))
        }
    }

    /// `QUIT`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; a missing/garbled final
    /// reply is not treated as fatal (mirrors the SMTP `QUIT` rule).
    pub async fn quit(mut self) -> Result<()> {
        let _ = self.send(Command::Quit).await;
        Ok(())
    }

    async fn fetch_multiline(&mut self, cmd: Command, expect: ReplyCode) -> Result<Vec<String>> {
        let reply = self.send(cmd).await?;
        if reply.code != expect {
            return Err(Error::reply(reply.code.as_u16(), reply.text));
        }
        self.stream.read_dotted_block().await
    }

    /// Sends `cmd`, reading one status line. Implements the deferred
    /// `AUTHINFO` retry of spec §4.4 / §8 scenario 4: a `480` response
    /// triggers `AUTHINFO USER`/`AUTHINFO PASS`, then the *original*
    /// command is retried exactly once. A second failure sets
    /// `auth_failed` and returns the error as-is.
    async fn send(&mut self, cmd: Command) -> Result<Reply> {
        self.stream.write_raw(cmd.serialize().as_bytes()).await?;
        let line = self.stream.read_line().await?;
        let reply = parse_reply(&line)?;

        if reply.code == ReplyCode::AUTH_REQUIRED && !self.auth_failed {
            if self.authinfo().await.is_ok() {
                self.stream.write_raw(cmd.serialize().as_bytes()).await?;
                let retry_line = self.stream.read_line().await?;
                let retry_reply = parse_reply(&retry_line)?;
                if retry_reply.code == ReplyCode::AUTH_REQUIRED
                    || retry_reply.code == ReplyCode::AUTH_REJECTED
                {
                    self.auth_failed = true;
                }
                return Ok(retry_reply);
            }
            self.auth_failed = true;
        }

        Ok(reply)
    }

    /// `AUTHINFO USER` followed by `AUTHINFO PASS` on a `381`
    /// continuation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthFail`] if no credentials are configured or
    /// the server rejects them.
    async fn authinfo(&mut self) -> Result<()> {
        let creds = self
            .credentials
            .clone()
            .ok_or_else(|| Error::AuthFail("no credentials configured for AUTHINFO".to_string()))?;

        self.stream
            .write_raw(Command::AuthInfoUser(creds.username).serialize().as_bytes())
            .await?;
        let line = self.stream.read_line().await?;
        let reply = parse_reply(&line)?;
        if reply.code != ReplyCode::AUTH_CONTINUE_PASS {
            return Err(Error::AuthFail(reply.text));
        }

        self.stream
            .write_raw(Command::AuthInfoPass(creds.password).serialize().as_bytes())
            .await?;
        let line = self.stream.read_line().await?;
        let reply = parse_reply(&line)?;
        if reply.code == ReplyCode::AUTH_ACCEPTED {
            Ok(())
        } else {
            Err(Error::AuthFail(reply.text))
        }
    }
}

fn parse_number_and_msgid(reply: &Reply, expect: ReplyCode) -> Result<(u64, String)> {
    if reply.code != expect {
        return Err(Error::reply(reply.code.as_u16(), reply.text.clone()));
    }
    let mut parts = reply.text.split_whitespace();
    let number: u64 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::Protocol(format!("malformed article status: {:?}", reply.text)))?;
    let msgid = parts.next().unwrap_or_default().to_string();
    Ok((number, msgid))
}
