//! Drives a parsed [`QueueInfo`](crate::queue::QueueInfo) through the SMTP
//! and/or NNTP client and applies the post-send flag updates.

use std::path::Path;

use mailcore_smtp::{Address, Client as SmtpClient};
use mailcore_transport::Endpoint;

use crate::error::{Error, Result};
use crate::queue::QueueInfo;

/// Security mode for an SMTP delivery target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// Plaintext; no TLS is attempted even if the server advertises it.
    Plain,
    /// Plaintext first, then `STARTTLS` before `AUTH`/`MAIL`.
    StartTls,
    /// Implicit TLS from the first byte (SMTPS, port 465 by default).
    Tls,
}

/// Where and how to deliver a message's mail recipients.
///
/// Resolving the queued `AID:` account id to one of these is the
/// caller's job — account storage is an external collaborator that this
/// crate has no dependency on.
#[derive(Debug, Clone)]
pub struct SmtpTarget {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// Security mode to use.
    pub security: SmtpSecurity,
    /// Name to present in EHLO/HELO.
    pub helo_name: String,
    /// Username for AUTH, if the server requires authentication.
    pub username: Option<String>,
    /// Password for AUTH.
    pub password: Option<String>,
}

/// Where and how to post a message's newsgroup recipients.
#[derive(Debug, Clone)]
pub struct NntpTarget {
    /// Connection endpoint (host, port, TLS mode, proxy, timeouts).
    pub endpoint: Endpoint,
    /// Username for `AUTHINFO`, if the server challenges with a 480.
    pub username: Option<String>,
    /// Password for `AUTHINFO`.
    pub password: Option<String>,
}

/// Addresses the originating folder storage to flip reply/forward bits
/// after a successful send. Implemented by the caller's local-folder
/// collaborator; this crate has no compile-time dependency on one.
#[async_trait::async_trait]
pub trait FlagTarget: Send + Sync {
    /// Marks the message at `target` (`<folder-path>/<msgnum>`) as
    /// replied to.
    async fn mark_replied(&self, target: &str) -> std::result::Result<(), String>;

    /// Marks each message in `targets` as forwarded, clearing any
    /// "replied" bit on them.
    async fn mark_forwarded(&self, targets: &[String]) -> std::result::Result<(), String>;
}

/// Receives a cleaned copy (queue header stripped) of a successfully
/// sent message, e.g. to save it into an Outbox folder.
#[async_trait::async_trait]
pub trait OutboxStore: Send + Sync {
    /// Saves `message` (the RFC 5322 body, queue header already
    /// stripped) to the store.
    async fn save(&self, message: &[u8]) -> std::result::Result<(), String>;
}

/// Dispatches one parsed queue message: sends it through SMTP and/or
/// posts it through NNTP per spec.md §4.6, then applies flag updates
/// and an optional Outbox copy.
///
/// `smtp`/`nntp` must be `Some` whenever `info` has the corresponding
/// recipients; `flags` and `outbox` are optional collaborators.
///
/// # Errors
///
/// Returns an error if a required target is missing, the SMTP send or
/// NNTP post fails, or a flag update / Outbox save fails.
pub async fn send_queued_message(
    info: &QueueInfo,
    smtp: Option<&SmtpTarget>,
    nntp: Option<&NntpTarget>,
    flags: Option<&dyn FlagTarget>,
    outbox: Option<&dyn OutboxStore>,
) -> Result<()> {
    send_queued_message_with_progress(info, smtp, nntp, flags, outbox, |_, _| {}).await
}

/// As [`send_queued_message`], but calls `on_progress(cur_bytes,
/// total_bytes)` while the SMTP `DATA` body streams out — the
/// `send_data_progressive_notify` callback named in spec §6.4,
/// surfaced here since the dispatcher is this workspace's only caller
/// of the SMTP client's progressive send.
///
/// # Errors
///
/// Returns an error if a required target is missing, the SMTP send or
/// NNTP post fails, or a flag update / Outbox save fails.
pub async fn send_queued_message_with_progress(
    info: &QueueInfo,
    smtp: Option<&SmtpTarget>,
    nntp: Option<&NntpTarget>,
    flags: Option<&dyn FlagTarget>,
    outbox: Option<&dyn OutboxStore>,
    mut on_progress: impl FnMut(u64, u64),
) -> Result<()> {
    if info.has_mail_recipients() {
        let target = smtp.ok_or(Error::NoTarget("SMTP"))?;
        send_via_smtp(target, info, &mut on_progress).await?;
    }

    if info.has_newsgroups() {
        let target = nntp.ok_or(Error::NoTarget("NNTP"))?;
        post_via_nntp(target, info).await?;
    }

    if let Some(flags) = flags {
        if let Some(reply_target) = &info.reply_target {
            flags
                .mark_replied(reply_target)
                .await
                .map_err(Error::FlagUpdate)?;
        }
        if !info.forward_targets.is_empty() {
            flags
                .mark_forwarded(&info.forward_targets)
                .await
                .map_err(Error::FlagUpdate)?;
        }
    }

    if let Some(outbox) = outbox {
        outbox.save(&info.body).await.map_err(Error::FlagUpdate)?;
    }

    Ok(())
}

async fn send_via_smtp(
    target: &SmtpTarget,
    info: &QueueInfo,
    on_progress: &mut impl FnMut(u64, u64),
) -> Result<()> {
    let stream = match target.security {
        SmtpSecurity::Tls => {
            mailcore_smtp::connection::connect_tls(&target.host, target.port).await?
        }
        SmtpSecurity::Plain | SmtpSecurity::StartTls => {
            mailcore_smtp::connection::connect(&target.host, target.port).await?
        }
    };

    let client = SmtpClient::from_stream(stream).await?;
    let client = client.ehlo(&target.helo_name).await?;

    let client = if target.security == SmtpSecurity::StartTls {
        client.starttls(&target.host).await?
    } else {
        client
    };

    let from = Address::new(info.sender.as_str())?;

    let mut recipients = info.recipients.iter();
    let first = recipients.next().ok_or(Error::NoRecipients)?;

    let client = match (&target.username, &target.password) {
        (Some(user), Some(pass)) => {
            let authed = client.authenticate(user, pass, None).await?;
            authed.mail_from(from).await?
        }
        _ => client.mail_from(from).await?,
    };

    let first_addr = Address::new(first.as_str())?;
    let mut client = client.rcpt_to(first_addr).await?;
    for recipient in recipients {
        let addr = Address::new(recipient.as_str())?;
        client = client.rcpt_to(addr).await?;
    }

    let client = client.data().await?;
    let client = client
        .send_message_with_progress(&info.body, |cur, total| on_progress(cur, total))
        .await?;
    client.quit().await?;

    Ok(())
}

async fn post_via_nntp(target: &NntpTarget, info: &QueueInfo) -> Result<()> {
    let credentials = match (&target.username, &target.password) {
        (Some(user), Some(pass)) => Some(mailcore_nntp::connection::Credentials {
            username: user.clone(),
            password: pass.clone(),
        }),
        _ => None,
    };

    let mut client = mailcore_nntp::Client::connect(&target.endpoint, credentials).await?;
    client.post(&info.body).await?;
    client.quit().await?;
    Ok(())
}

/// Enumerates `folder` in ascending numeric filename order and sends
/// each queued message through [`send_queued_message`]. Returns the
/// number successfully sent; failed messages are left in place.
///
/// # Errors
///
/// Returns an error only if the directory itself cannot be read — a
/// per-message failure is logged and counted, not propagated.
pub async fn queue_send_all(
    folder: &Path,
    smtp: Option<&SmtpTarget>,
    nntp: Option<&NntpTarget>,
    flags: Option<&dyn FlagTarget>,
    outbox: Option<&dyn OutboxStore>,
) -> Result<usize> {
    let mut entries: Vec<_> = std::fs::read_dir(folder)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .collect();
    entries.sort_by_key(|path| {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.parse::<u64>().ok())
            .unwrap_or(u64::MAX)
    });

    let mut sent = 0;
    for path in entries {
        let info = match QueueInfo::parse_file(&path) {
            Ok(info) => info,
            Err(err) => {
                tracing::warn!(?path, %err, "skipping malformed queue file");
                continue;
            }
        };

        match send_queued_message(&info, smtp, nntp, flags, outbox).await {
            Ok(()) => {
                sent += 1;
                if let Err(err) = std::fs::remove_file(&path) {
                    tracing::warn!(?path, %err, "sent message but failed to remove queue file");
                }
            }
            Err(err) => {
                tracing::warn!(?path, %err, "failed to send queued message, leaving in queue");
            }
        }
    }

    Ok(sent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_with_recipients() -> QueueInfo {
        QueueInfo::parse(b"S:alice@example.com\r\nR:bob@example.com\r\n\r\nbody").unwrap()
    }

    fn message_with_newsgroups() -> QueueInfo {
        QueueInfo::parse(b"S:alice@example.com\r\nNG:comp.lang.rust\r\n\r\nbody").unwrap()
    }

    #[tokio::test]
    async fn missing_smtp_target_is_rejected_before_any_io() {
        let info = message_with_recipients();
        let err = send_queued_message(&info, None, None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoTarget("SMTP")));
    }

    #[tokio::test]
    async fn missing_nntp_target_is_rejected_before_any_io() {
        let info = message_with_newsgroups();
        let err = send_queued_message(&info, None, None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoTarget("NNTP")));
    }

    #[tokio::test]
    async fn message_with_neither_recipients_nor_newsgroups_is_a_no_op() {
        let info = QueueInfo::parse(b"S:alice@example.com\r\n\r\nbody").unwrap();
        send_queued_message(&info, None, None, None, None)
            .await
            .unwrap();
    }
}
