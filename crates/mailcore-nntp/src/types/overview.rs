//! `XOVER` overview-line parsing (spec §4.4).

use mailcore_codec::encoding::decode_rfc2047;

/// One tab-delimited `XOVER` record: number, subject, from, date,
/// message-id, references, byte size, line count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewLine {
    /// Article number within the selected group.
    pub number: u64,
    /// Subject header, MIME-unfolded to UTF-8.
    pub subject: String,
    /// From header, MIME-unfolded to UTF-8.
    pub from: String,
    /// Date header, verbatim.
    pub date: String,
    /// Message-ID, including angle brackets, whitespace stripped.
    pub message_id: String,
    /// References header, verbatim.
    pub references: String,
    /// Byte size as reported by the server.
    pub size: u64,
    /// Line count as reported by the server.
    pub lines: u64,
}

impl OverviewLine {
    /// Parses one line of an `XOVER` response.
    ///
    /// Per spec §4.4, the line is tab-delimited; trailing CR/LF are
    /// stripped before splitting, and the subject/from fields are
    /// MIME-unfolded to UTF-8 (falling back to the raw field on a
    /// decode failure, never erroring the whole line). A short line
    /// (fewer than 8 fields) is a [`crate::Error::Protocol`] — the
    /// caller logs it as a warning per spec §7 and skips the record.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Protocol`] if fewer than 8 tab-delimited
    /// fields are present, or the article number is not numeric.
    pub fn parse(line: &str) -> crate::Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 8 {
            return Err(crate::Error::Protocol(format!(
                "malformed XOVER line (expected 8 fields, got {}): {line:?}",
                fields.len()
            )));
        }

        let number: u64 = fields[0]
            .parse()
            .map_err(|_| crate::Error::Protocol(format!("non-numeric article number in XOVER line: {line:?}")))?;
        let size: u64 = fields[6].parse().unwrap_or(0);
        let lines: u64 = fields[7].parse().unwrap_or(0);

        Ok(Self {
            number,
            subject: unfold(fields[1]),
            from: unfold(fields[2]),
            date: fields[3].to_string(),
            message_id: extract_msgid(fields[4]),
            references: fields[5].to_string(),
            size,
            lines,
        })
    }
}

/// MIME-unfolds a header field, falling back to the raw text if it is
/// not validly encoded (spec §4.3.4's "never raising" discipline
/// applies equally here).
fn unfold(field: &str) -> String {
    decode_rfc2047(field).unwrap_or_else(|_| field.to_string())
}

/// Extracts a `<msg-id>` token, eliminating any interior whitespace some
/// servers insert inside the angle brackets.
fn extract_msgid(field: &str) -> String {
    field.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_line() {
        let line = "101\tHello world\talice@example.com\tMon, 1 Jan 2024 00:00:00 +0000\t<msg1@example.com>\t\t1234\t42\r\n";
        let ov = OverviewLine::parse(line).unwrap();
        assert_eq!(ov.number, 101);
        assert_eq!(ov.subject, "Hello world");
        assert_eq!(ov.message_id, "<msg1@example.com>");
        assert_eq!(ov.size, 1234);
        assert_eq!(ov.lines, 42);
    }

    #[test]
    fn eliminates_whitespace_in_message_id() {
        let line = "1\tS\tF\tD\t< msg1 @ example . com >\t\t1\t1";
        let ov = OverviewLine::parse(line).unwrap();
        assert_eq!(ov.message_id, "<msg1@example.com>");
    }

    #[test]
    fn rejects_short_line() {
        assert!(OverviewLine::parse("1\tonly\tthree\tfields").is_err());
    }
}
