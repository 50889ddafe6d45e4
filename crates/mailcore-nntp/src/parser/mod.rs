//! Reply-line and dot-terminated multi-line block parsing.

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// Parses a single status line (`<code> <text>`) into a [`Reply`].
///
/// # Errors
///
/// Returns [`Error::Protocol`] if the line does not start with a
/// three-digit code.
pub fn parse_reply(line: &str) -> Result<Reply> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.len() < 3 || !line.as_bytes()[..3].iter().all(u8::is_ascii_digit) {
        return Err(Error::Protocol(format!("malformed reply line: {line:?}")));
    }
    let code: u16 = line[..3]
        .parse()
        .map_err(|_| Error::Protocol(format!("malformed reply code: {line:?}")))?;
    let text = line.get(4..).unwrap_or("").to_string();
    Ok(Reply::new(ReplyCode(code), text))
}

/// Un-dot-stuffs and strips the terminator from a multi-line dot-terminated
/// block (RFC 3977 §3.1.1): a leading `..` on a line becomes `.`, and the
/// lone `.` terminator line is not included in the result.
#[must_use]
pub fn dedot_lines(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|line| {
            if let Some(stripped) = line.strip_prefix("..") {
                format!(".{stripped}")
            } else {
                line
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reply_with_text() {
        let reply = parse_reply("211 42 1 42 comp.lang.rust\r\n").unwrap();
        assert_eq!(reply.code.as_u16(), 211);
        assert_eq!(reply.text, "42 1 42 comp.lang.rust");
    }

    #[test]
    fn parses_reply_with_no_text() {
        let reply = parse_reply("205").unwrap();
        assert_eq!(reply.code.as_u16(), 205);
        assert_eq!(reply.text, "");
    }

    #[test]
    fn rejects_non_numeric_code() {
        assert!(parse_reply("abc some text").is_err());
    }

    #[test]
    fn dedots_stuffed_lines() {
        let input = vec!["..leading dot".to_string(), "plain".to_string()];
        let output = dedot_lines(input);
        assert_eq!(output, vec![".leading dot".to_string(), "plain".to_string()]);
    }
}
