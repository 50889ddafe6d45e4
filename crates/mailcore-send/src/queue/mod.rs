//! Queued-message file parsing: the header block + RFC 5322 body format.

use std::path::Path;

use crate::error::{Error, Result};

/// A parsed queued-message file: the leading `KEY:value` header block
/// plus the RFC 5322 body that follows the mandatory blank line.
///
/// Reserved keys (`SSH:`, `RQ:`, `AF:`, `NF:`, `PS:`, `SRH:`, `SFN:`,
/// `DSR:`, `CFG:`, `PT:`) are recognized and ignored; any other unknown
/// key is likewise ignored rather than rejected, so newer writers can
/// add bookkeeping fields without breaking older readers.
#[derive(Debug, Clone)]
pub struct QueueInfo {
    /// Envelope sender (`S:`).
    pub sender: String,
    /// SMTP server hint (`SSV:`).
    pub smtp_server: Option<String>,
    /// NNTP server hint (`NSV:`).
    pub nntp_server: Option<String>,
    /// Mail recipients (`R:`).
    pub recipients: Vec<String>,
    /// Originating account id (`AID:`).
    pub account_id: Option<i64>,
    /// Reply target, `<folder-id>/<msgnum>` (`REP:`).
    pub reply_target: Option<String>,
    /// Forward targets, one per `FWD:` line.
    pub forward_targets: Vec<String>,
    /// Message-ID, with angle brackets (`MID:`).
    pub message_id: Option<String>,
    /// Newsgroups to post to (`NG:`).
    pub newsgroups: Vec<String>,
    /// The RFC 5322 message, header block stripped.
    pub body: Vec<u8>,
}

impl QueueInfo {
    /// Reads and parses a queued-message file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or if it is
    /// malformed per [`Self::parse`].
    pub fn parse_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read(path)?;
        Self::parse(&raw)
    }

    /// Parses queue-file bytes directly.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedQueueFile`] if the blank-line terminator
    /// between the header block and the body is missing, or the header
    /// block is not valid UTF-8.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let header_end = find_header_end(raw).ok_or(Error::MalformedQueueFile)?;
        let header =
            std::str::from_utf8(&raw[..header_end]).map_err(|_| Error::MalformedQueueFile)?;

        let mut info = Self {
            sender: String::new(),
            smtp_server: None,
            nntp_server: None,
            recipients: Vec::new(),
            account_id: None,
            reply_target: None,
            forward_targets: Vec::new(),
            message_id: None,
            newsgroups: Vec::new(),
            body: raw[header_end..].to_vec(),
        };

        for line in header.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key {
                "S" => info.sender = value.to_string(),
                "SSV" => info.smtp_server = Some(value.to_string()),
                "NSV" => info.nntp_server = Some(value.to_string()),
                "R" => info.recipients = split_list(value),
                "AID" => info.account_id = value.parse().ok(),
                "REP" => info.reply_target = Some(value.to_string()),
                "FWD" => info.forward_targets.push(value.to_string()),
                "MID" => info.message_id = Some(value.to_string()),
                "NG" => info.newsgroups = split_list(value),
                // Reserved/book-keeping keys and anything else unrecognized
                // are ignored on read.
                _ => {}
            }
        }

        Ok(info)
    }

    /// Whether this message has any mail (SMTP) recipients.
    #[must_use]
    pub fn has_mail_recipients(&self) -> bool {
        !self.recipients.is_empty()
    }

    /// Whether this message targets any newsgroups.
    #[must_use]
    pub fn has_newsgroups(&self) -> bool {
        !self.newsgroups.is_empty()
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Finds the index just past the first blank-line terminator (`\n\n` or
/// `\r\n\r\n`) separating the header block from the body.
fn find_header_end(raw: &[u8]) -> Option<usize> {
    if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
        return Some(pos + 4);
    }
    raw.windows(2).position(|w| w == b"\n\n").map(|pos| pos + 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_mail_message() {
        let raw = b"S:alice@example.com\r\nR:bob@example.com, carol@example.com\r\nAID:3\r\n\r\nFrom: alice@example.com\r\nTo: bob@example.com\r\n\r\nhello\r\n";
        let info = QueueInfo::parse(raw).unwrap();
        assert_eq!(info.sender, "alice@example.com");
        assert_eq!(
            info.recipients,
            vec!["bob@example.com".to_string(), "carol@example.com".to_string()]
        );
        assert_eq!(info.account_id, Some(3));
        assert!(info.body.starts_with(b"From: alice@example.com"));
        assert!(info.has_mail_recipients());
        assert!(!info.has_newsgroups());
    }

    #[test]
    fn parses_newsgroup_message_with_reply_and_forward_targets() {
        let raw = b"S:alice@example.com\r\nNG:comp.lang.rust,comp.os.misc\r\nREP:inbox/42\r\nFWD:inbox/7\r\nFWD:drafts/1\r\nMID:<abc@example.com>\r\n\r\nbody\r\n";
        let info = QueueInfo::parse(raw).unwrap();
        assert_eq!(
            info.newsgroups,
            vec!["comp.lang.rust".to_string(), "comp.os.misc".to_string()]
        );
        assert_eq!(info.reply_target, Some("inbox/42".to_string()));
        assert_eq!(
            info.forward_targets,
            vec!["inbox/7".to_string(), "drafts/1".to_string()]
        );
        assert_eq!(info.message_id, Some("<abc@example.com>".to_string()));
        assert!(info.has_newsgroups());
    }

    #[test]
    fn ignores_reserved_bookkeeping_keys() {
        let raw = b"S:a@b.c\r\nSSH:ignored\r\nRQ:ignored\r\nAF:ignored\r\nNF:ignored\r\nPS:ignored\r\nSRH:ignored\r\nSFN:ignored\r\nDSR:ignored\r\nCFG:ignored\r\nPT:ignored\r\n\r\nbody";
        let info = QueueInfo::parse(raw).unwrap();
        assert_eq!(info.sender, "a@b.c");
        assert_eq!(info.body, b"body");
    }

    #[test]
    fn accepts_lf_only_terminator() {
        let raw = b"S:a@b.c\nR:x@y.z\n\nbody";
        let info = QueueInfo::parse(raw).unwrap();
        assert_eq!(info.recipients, vec!["x@y.z".to_string()]);
        assert_eq!(info.body, b"body");
    }

    #[test]
    fn rejects_missing_blank_line() {
        let raw = b"S:a@b.c\r\nR:x@y.z\r\nno blank line here";
        assert!(matches!(
            QueueInfo::parse(raw),
            Err(Error::MalformedQueueFile)
        ));
    }
}
