//! Implementation for the not-authenticated state.

use std::marker::PhantomData;

use tokio::io::{AsyncRead, AsyncWrite};

use super::Client;
use super::states::{Authenticated, NotAuthenticated};
use crate::command::{Command, TagGenerator};
use crate::connection::framed::FramedStream;
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{Capability, ResponseCode};
use crate::{Error, Result};
use mailcore_codec::encoding::encode_base64;
use mailcore_codec::hmac_md5;

/// The SASL-ish mechanisms this client can drive through `AUTHENTICATE`,
/// in the preference order of spec §4.3.3: `CRAM-MD5` beats `PLAIN`, which
/// beats plain `LOGIN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMechanism {
    /// `AUTHENTICATE CRAM-MD5` (RFC 2195).
    CramMd5,
    /// `AUTHENTICATE PLAIN` (RFC 4616).
    Plain,
    /// Plain `LOGIN` command.
    Login,
}

impl<S> Client<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new client from a connected stream.
    ///
    /// Reads the server greeting and initial capabilities.
    pub async fn from_stream(stream: S) -> Result<Self> {
        let mut framed = FramedStream::new(stream);

        // Read server greeting
        let greeting = framed.read_response().await?;
        let response = ResponseParser::parse(&greeting)?;

        // Extract capabilities from greeting if present
        let mut capabilities = Vec::new();
        if let Response::Untagged(untagged) = response {
            match untagged {
                UntaggedResponse::Ok {
                    code: Some(ResponseCode::Capability(caps)),
                    ..
                }
                | UntaggedResponse::PreAuth {
                    code: Some(ResponseCode::Capability(caps)),
                    ..
                } => {
                    capabilities = caps;
                }
                UntaggedResponse::Bye { text, .. } => {
                    return Err(Error::Bye(text));
                }
                _ => {}
            }
        }

        Ok(Self {
            stream: framed,
            tag_gen: TagGenerator::default(),
            capabilities,
            mailbox: None,
            _state: PhantomData,
        })
    }

    /// Authenticates with the server using LOGIN.
    ///
    /// Consumes self and returns an authenticated client on success.
    pub async fn login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        let tag = self.tag_gen.next();
        let cmd = Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        }
        .serialize(&tag);

        self.stream.write_command(&cmd).await?;

        let responses = self.read_until_tagged(&tag).await?;

        // Update capabilities if included in response
        for response_bytes in &responses {
            if let Ok(Response::Untagged(UntaggedResponse::Capability(caps))) =
                ResponseParser::parse(response_bytes)
            {
                self.capabilities = caps;
            }
        }

        Self::check_tagged_ok(&responses, &tag)?;

        Ok(Client {
            stream: self.stream,
            tag_gen: self.tag_gen,
            capabilities: self.capabilities,
            mailbox: None,
            _state: PhantomData,
        })
    }

    /// Picks the strongest mechanism the server advertised, per spec
    /// §4.3.3: `AUTH=CRAM-MD5` over `AUTH=PLAIN` over plain `LOGIN`;
    /// `LOGINDISABLED` removes `LOGIN` from consideration entirely.
    #[must_use]
    pub fn best_auth_mechanism(&self) -> Option<AuthMechanism> {
        let has_auth = |name: &str| {
            self.capabilities
                .iter()
                .any(|c| matches!(c, Capability::Auth(m) if m.eq_ignore_ascii_case(name)))
        };

        if has_auth("CRAM-MD5") {
            Some(AuthMechanism::CramMd5)
        } else if has_auth("PLAIN") {
            Some(AuthMechanism::Plain)
        } else if !self.login_disabled() {
            Some(AuthMechanism::Login)
        } else {
            None
        }
    }

    /// Authenticates using the best mechanism the server advertises.
    ///
    /// Implements the negotiation rule of spec §4.3.3 and §8 ("Server
    /// offers no advertised AUTH and sets `LOGINDISABLED`"): when neither
    /// an AUTH mechanism nor `LOGIN` is usable, this returns
    /// [`Error::Auth`] immediately without sending anything on the wire.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] if no usable mechanism is advertised or if
    /// the server rejects the credentials.
    pub async fn authenticate(
        self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        match self.best_auth_mechanism() {
            Some(AuthMechanism::CramMd5) => self.auth_cram_md5(username, password).await,
            Some(AuthMechanism::Plain) => self.auth_plain(username, password).await,
            Some(AuthMechanism::Login) => self.login(username, password).await,
            None => Err(Error::Auth(
                "no usable authentication mechanism (LOGINDISABLED, no AUTH=)".to_string(),
            )),
        }
    }

    /// Authenticates with `AUTHENTICATE CRAM-MD5` (RFC 2195).
    ///
    /// Waits for the server's base64 challenge on a `+` continuation,
    /// computes the HMAC-MD5 response over the decoded challenge, and
    /// replies `<user> <hex-digest>`, base64-encoded, on the next line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] if the server rejects the credentials, or
    /// [`Error::Protocol`] if no continuation challenge is sent.
    pub async fn auth_cram_md5(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        let tag = self.tag_gen.next();
        let cmd = Command::Authenticate {
            mechanism: "CRAM-MD5".to_string(),
            initial_response: None,
        }
        .serialize(&tag);
        self.stream.write_command(&cmd).await?;

        let challenge_line = self.stream.read_response().await?;
        let challenge_text = String::from_utf8_lossy(&challenge_line);
        let challenge_b64 = challenge_text
            .strip_prefix('+')
            .map(str::trim)
            .ok_or_else(|| Error::Protocol("expected '+' continuation for CRAM-MD5".to_string()))?;

        let response =
            hmac_md5::respond(challenge_b64, username, password).map_err(|e| Error::Auth(e.to_string()))?;

        self.stream
            .write_raw(format!("{response}\r\n").as_bytes())
            .await?;

        let responses = self.read_until_tagged(&tag).await?;
        self.absorb_capabilities(&responses);
        Self::check_tagged_ok(&responses, &tag).map_err(Self::as_auth_failure)?;

        Ok(Client {
            stream: self.stream,
            tag_gen: self.tag_gen,
            capabilities: self.capabilities,
            mailbox: None,
            _state: PhantomData,
        })
    }

    /// Authenticates with `AUTHENTICATE PLAIN` (RFC 4616): a single
    /// base64-encoded `\0<user>\0<pass>` initial response, no
    /// continuation round-trip required.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] if the server rejects the credentials.
    pub async fn auth_plain(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        let mut raw = Vec::with_capacity(username.len() * 2 + password.len() + 2);
        raw.push(0u8);
        raw.extend_from_slice(username.as_bytes());
        raw.push(0u8);
        raw.extend_from_slice(password.as_bytes());
        let initial = encode_base64(&raw);

        let tag = self.tag_gen.next();
        let cmd = Command::Authenticate {
            mechanism: "PLAIN".to_string(),
            initial_response: Some(initial),
        }
        .serialize(&tag);
        self.stream.write_command(&cmd).await?;

        let responses = self.read_until_tagged(&tag).await?;
        self.absorb_capabilities(&responses);
        Self::check_tagged_ok(&responses, &tag).map_err(Self::as_auth_failure)?;

        Ok(Client {
            stream: self.stream,
            tag_gen: self.tag_gen,
            capabilities: self.capabilities,
            mailbox: None,
            _state: PhantomData,
        })
    }

    fn absorb_capabilities(&mut self, responses: &[Vec<u8>]) {
        for response_bytes in responses {
            if let Ok(Response::Untagged(UntaggedResponse::Capability(caps))) =
                ResponseParser::parse(response_bytes)
            {
                self.capabilities = caps;
            }
        }
    }

    /// `NO`/`BAD` on an AUTHENTICATE exchange is always an authentication
    /// failure (spec §7: auth errors do not terminate an IMAP session, so
    /// the caller can retry with a different mechanism or cached
    /// password), distinct from a generic protocol error.
    fn as_auth_failure(err: Error) -> Error {
        match err {
            Error::No(msg) | Error::Bad(msg) => Error::Auth(msg),
            other => other,
        }
    }

    /// Gracefully disconnects from the server.
    pub async fn logout(mut self) -> Result<()> {
        let tag = self.tag_gen.next();
        let cmd = Command::Logout.serialize(&tag);
        self.stream.write_command(&cmd).await?;

        // Read until we get the tagged response or BYE
        let _ = self.read_until_tagged(&tag).await;

        Ok(())
    }
}
