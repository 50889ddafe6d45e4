//! Implementation for the authenticated state.

use std::fmt::Write;
use std::marker::PhantomData;

use tokio::io::{AsyncRead, AsyncWrite};

use super::Client;
use super::states::{Authenticated, Selected};
use crate::command::Command;
use crate::parser::{Response, ResponseParser, StatusItem, UntaggedResponse};
use crate::types::{AppendOutcome, Mailbox, MailboxStatus, Namespace, ResponseCode, Status, Uid};
use crate::{Error, Result};

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Selects a mailbox for read-write access.
    ///
    /// Consumes self and returns a selected client on success.
    pub async fn select(mut self, mailbox: &str) -> Result<(Client<S, Selected>, MailboxStatus)> {
        let tag = self.tag_gen.next();
        let cmd = Command::Select {
            mailbox: Mailbox::new(mailcore_codec::mutf7::encode(mailbox)),
            condstore: false,
        }
        .serialize(&tag);

        self.stream.write_command(&cmd).await?;

        let responses = self.read_until_tagged(&tag).await?;
        let status = Self::parse_mailbox_status(&responses);
        Self::check_tagged_ok(&responses, &tag)?;

        Ok((
            Client {
                stream: self.stream,
                tag_gen: self.tag_gen,
                capabilities: self.capabilities,
                mailbox: Some(mailbox.to_string()),
                _state: PhantomData,
            },
            status,
        ))
    }

    /// Examines a mailbox for read-only access.
    ///
    /// Consumes self and returns a selected client on success.
    pub async fn examine(mut self, mailbox: &str) -> Result<(Client<S, Selected>, MailboxStatus)> {
        let tag = self.tag_gen.next();
        let cmd = Command::Examine {
            mailbox: Mailbox::new(mailcore_codec::mutf7::encode(mailbox)),
        }
        .serialize(&tag);

        self.stream.write_command(&cmd).await?;

        let responses = self.read_until_tagged(&tag).await?;
        let status = Self::parse_mailbox_status(&responses);
        Self::check_tagged_ok(&responses, &tag)?;

        Ok((
            Client {
                stream: self.stream,
                tag_gen: self.tag_gen,
                capabilities: self.capabilities,
                mailbox: Some(mailbox.to_string()),
                _state: PhantomData,
            },
            status,
        ))
    }

    /// Lists mailboxes matching a pattern.
    pub async fn list(
        &mut self,
        reference: &str,
        pattern: &str,
    ) -> Result<Vec<crate::types::ListResponse>> {
        let tag = self.tag_gen.next();
        let cmd = Command::List {
            reference: reference.to_string(),
            pattern: pattern.to_string(),
        }
        .serialize(&tag);

        self.stream.write_command(&cmd).await?;

        let responses = self.read_until_tagged(&tag).await?;
        let mut list_responses = Vec::new();

        for response_bytes in &responses {
            if let Ok(Response::Untagged(UntaggedResponse::List(item))) =
                ResponseParser::parse(response_bytes)
            {
                list_responses.push(item);
            }
        }

        Self::check_tagged_ok(&responses, &tag)?;
        Ok(list_responses)
    }

    /// Retrieves the server's namespace layout (RFC 2342).
    ///
    /// Issues `NAMESPACE` when the server has advertised the capability.
    /// If it hasn't, or the command fails, falls back to a `LIST "" ""`
    /// probe and reports a single personal namespace using whatever
    /// hierarchy delimiter that returns.
    pub async fn namespace(&mut self) -> Result<Namespace> {
        if self.supports_namespace() {
            let tag = self.tag_gen.next();
            let cmd = Command::Namespace.serialize(&tag);
            self.stream.write_command(&cmd).await?;

            let responses = self.read_until_tagged(&tag).await?;
            let namespace = responses.iter().find_map(|response_bytes| {
                match ResponseParser::parse(response_bytes) {
                    Ok(Response::Untagged(UntaggedResponse::Namespace(ns))) => Some(ns),
                    _ => None,
                }
            });

            if let (Ok(()), Some(namespace)) =
                (Self::check_tagged_ok(&responses, &tag), namespace)
            {
                return Ok(namespace);
            }
        }

        self.namespace_from_list_probe().await
    }

    /// `LIST "" ""` probe used when NAMESPACE is unsupported or unusable.
    async fn namespace_from_list_probe(&mut self) -> Result<Namespace> {
        let listing = self.list("", "").await?;
        let separator = listing.first().and_then(|entry| entry.delimiter);
        Ok(Namespace::from_list_probe(separator))
    }

    /// Creates a new mailbox.
    pub async fn create(&mut self, mailbox: &str) -> Result<()> {
        let tag = self.tag_gen.next();
        let cmd = Command::Create {
            mailbox: Mailbox::new(mailcore_codec::mutf7::encode(mailbox)),
        }
        .serialize(&tag);

        self.stream.write_command(&cmd).await?;

        let responses = self.read_until_tagged(&tag).await?;
        Self::check_tagged_ok(&responses, &tag)?;
        Ok(())
    }

    /// Deletes a mailbox.
    pub async fn delete(&mut self, mailbox: &str) -> Result<()> {
        let tag = self.tag_gen.next();
        let cmd = Command::Delete {
            mailbox: Mailbox::new(mailcore_codec::mutf7::encode(mailbox)),
        }
        .serialize(&tag);

        self.stream.write_command(&cmd).await?;

        let responses = self.read_until_tagged(&tag).await?;
        Self::check_tagged_ok(&responses, &tag)?;
        Ok(())
    }

    /// Renames a mailbox.
    pub async fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        let tag = self.tag_gen.next();
        let cmd = Command::Rename {
            from: Mailbox::new(mailcore_codec::mutf7::encode(from)),
            to: Mailbox::new(mailcore_codec::mutf7::encode(to)),
        }
        .serialize(&tag);

        self.stream.write_command(&cmd).await?;

        let responses = self.read_until_tagged(&tag).await?;
        Self::check_tagged_ok(&responses, &tag)?;
        Ok(())
    }

    /// Subscribes to a mailbox.
    pub async fn subscribe(&mut self, mailbox: &str) -> Result<()> {
        let tag = self.tag_gen.next();
        let cmd = Command::Subscribe {
            mailbox: Mailbox::new(mailcore_codec::mutf7::encode(mailbox)),
        }
        .serialize(&tag);

        self.stream.write_command(&cmd).await?;

        let responses = self.read_until_tagged(&tag).await?;
        Self::check_tagged_ok(&responses, &tag)?;
        Ok(())
    }

    /// Unsubscribes from a mailbox.
    pub async fn unsubscribe(&mut self, mailbox: &str) -> Result<()> {
        let tag = self.tag_gen.next();
        let cmd = Command::Unsubscribe {
            mailbox: Mailbox::new(mailcore_codec::mutf7::encode(mailbox)),
        }
        .serialize(&tag);

        self.stream.write_command(&cmd).await?;

        let responses = self.read_until_tagged(&tag).await?;
        Self::check_tagged_ok(&responses, &tag)?;
        Ok(())
    }

    /// Gets the status of a mailbox without selecting it.
    pub async fn status(
        &mut self,
        mailbox: &str,
        items: Vec<crate::command::StatusAttribute>,
    ) -> Result<Vec<StatusItem>> {
        let tag = self.tag_gen.next();
        let cmd = Command::Status {
            mailbox: Mailbox::new(mailcore_codec::mutf7::encode(mailbox)),
            items,
        }
        .serialize(&tag);

        self.stream.write_command(&cmd).await?;

        let responses = self.read_until_tagged(&tag).await?;
        let mut result = Vec::new();

        for response_bytes in &responses {
            if let Ok(Response::Untagged(UntaggedResponse::Status { items, .. })) =
                ResponseParser::parse(response_bytes)
            {
                result.extend(items);
            }
        }

        Self::check_tagged_ok(&responses, &tag)?;
        Ok(result)
    }

    /// Appends a message to a mailbox.
    ///
    /// The message should be a complete RFC 5322 message. `uid_next_hint`
    /// is an optional `UIDNEXT` baseline (from a prior SELECT/STATUS of
    /// `mailbox`) used only as a fallback when the server lacks UIDPLUS;
    /// see [`AppendOutcome`].
    pub async fn append(
        &mut self,
        mailbox: &str,
        flags: Option<Vec<crate::types::Flag>>,
        message: &[u8],
        uid_next_hint: Option<Uid>,
    ) -> Result<AppendOutcome> {
        let tag = self.tag_gen.next();

        // APPEND uses literals which require continuation handling
        // First, send the command with literal size
        let mut cmd = format!("{tag} APPEND ");
        cmd.push_str(&Mailbox::new(mailcore_codec::mutf7::encode(mailbox)).to_string());
        if let Some(ref f) = flags {
            cmd.push_str(" (");
            for (i, flag) in f.iter().enumerate() {
                if i > 0 {
                    cmd.push(' ');
                }
                cmd.push_str(flag.as_str());
            }
            cmd.push(')');
        }
        // Writing to a String never fails
        let _ = write!(cmd, " {{{}}}\r\n", message.len());

        self.stream.write_command(cmd.as_bytes()).await?;

        // Wait for continuation response
        let response = self.stream.read_response().await?;
        if !response.starts_with(b"+") {
            let parsed = ResponseParser::parse(&response)?;
            if let Response::Tagged { status, text, .. } = parsed {
                return match status {
                    Status::No => Err(Error::No(text)),
                    Status::Bad => Err(Error::Bad(text)),
                    _ => Err(Error::Protocol("unexpected response to APPEND".to_string())),
                };
            }
            return Err(Error::Protocol(
                "expected continuation for APPEND".to_string(),
            ));
        }

        // Send the message data
        self.stream.write_command(message).await?;
        self.stream.write_command(b"\r\n").await?;

        // Read the tagged response
        let responses = self.read_until_tagged(&tag).await?;
        let code = Self::check_tagged_ok_code(&responses, &tag)?;

        Ok(match code {
            Some(ResponseCode::AppendUid { uidvalidity, uid }) => AppendOutcome::Exact {
                uid_validity: uidvalidity,
                uid,
            },
            _ => uid_next_hint.map_or(AppendOutcome::Unknown, AppendOutcome::Heuristic),
        })
    }

    /// Gracefully disconnects from the server.
    pub async fn logout(mut self) -> Result<()> {
        let tag = self.tag_gen.next();
        let cmd = Command::Logout.serialize(&tag);
        self.stream.write_command(&cmd).await?;

        let _ = self.read_until_tagged(&tag).await;
        Ok(())
    }

    /// Parses mailbox status from SELECT/EXAMINE responses.
    pub(super) fn parse_mailbox_status(responses: &[Vec<u8>]) -> MailboxStatus {
        let mut status = MailboxStatus::default();

        for response_bytes in responses {
            if let Ok(Response::Untagged(untagged)) = ResponseParser::parse(response_bytes) {
                match untagged {
                    UntaggedResponse::Exists(n) => status.exists = n,
                    UntaggedResponse::Recent(n) => status.recent = n,
                    UntaggedResponse::Flags(flags) => status.flags = flags,
                    UntaggedResponse::Ok {
                        code: Some(code), ..
                    } => match code {
                        ResponseCode::UidValidity(v) => {
                            status.uid_validity = Some(v);
                        }
                        ResponseCode::UidNext(v) => {
                            status.uid_next = Some(v);
                        }
                        ResponseCode::Unseen(v) => {
                            status.unseen = Some(v);
                        }
                        _ => {}
                    },
                    _ => {}
                }
            }
        }

        status
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::command::TagGenerator;
    use crate::connection::framed::FramedStream;

    fn client_with(mock: tokio_test::io::Mock) -> Client<tokio_test::io::Mock, Authenticated> {
        Client {
            stream: FramedStream::new(mock),
            tag_gen: TagGenerator::default(),
            capabilities: Vec::new(),
            mailbox: None,
            _state: PhantomData,
        }
    }

    #[tokio::test]
    async fn select_encodes_unicode_mailbox_name_as_modified_utf7() {
        // "日本語" (spec §8 scenario 2) encodes to mUTF-7 "&ZeVnLIqe-"; since
        // that contains '&' (spec §4.3.1 quoting set) it is sent quoted.
        let mock = tokio_test::io::Builder::new()
            .write(b"A0000 SELECT \"&ZeVnLIqe-\"\r\n")
            .read(b"* 3 EXISTS\r\nA0000 OK SELECT completed\r\n")
            .build();
        let client = client_with(mock);

        let (_selected, status) = client.select("日本語").await.unwrap();
        assert_eq!(status.exists, 3);
    }

    #[tokio::test]
    async fn create_encodes_unicode_mailbox_name() {
        let mock = tokio_test::io::Builder::new()
            .write(b"A0000 CREATE \"&ZeVnLIqe-\"\r\n")
            .read(b"A0000 OK CREATE completed\r\n")
            .build();
        let mut client = client_with(mock);

        client.create("日本語").await.unwrap();
    }

    fn client_with_capabilities(
        mock: tokio_test::io::Mock,
        capabilities: Vec<crate::types::Capability>,
    ) -> Client<tokio_test::io::Mock, Authenticated> {
        Client {
            stream: FramedStream::new(mock),
            tag_gen: TagGenerator::default(),
            capabilities,
            mailbox: None,
            _state: PhantomData,
        }
    }

    #[tokio::test]
    async fn namespace_uses_namespace_command_when_supported() {
        let mock = tokio_test::io::Builder::new()
            .write(b"A0000 NAMESPACE\r\n")
            .read(b"* NAMESPACE ((\"\" \"/\")) NIL NIL\r\nA0000 OK NAMESPACE completed\r\n")
            .build();
        let mut client = client_with_capabilities(mock, vec![crate::types::Capability::Namespace]);

        let ns = client.namespace().await.unwrap();
        assert_eq!(ns.personal.len(), 1);
        assert_eq!(ns.personal[0].separator, Some('/'));
        assert!(ns.other_users.is_empty());
        assert!(ns.shared.is_empty());
    }

    #[tokio::test]
    async fn namespace_falls_back_to_list_probe_when_unsupported() {
        let mock = tokio_test::io::Builder::new()
            .write(b"A0000 LIST \"\" \"\"\r\n")
            .read(b"* LIST (\\Noselect) \"/\" \"\"\r\nA0000 OK LIST completed\r\n")
            .build();
        let mut client = client_with(mock);

        let ns = client.namespace().await.unwrap();
        assert_eq!(ns.personal.len(), 1);
        assert_eq!(ns.personal[0].prefix, "");
        assert_eq!(ns.personal[0].separator, Some('/'));
        assert!(ns.other_users.is_empty());
        assert!(ns.shared.is_empty());
    }
}
