//! Selected-newsgroup state (spec §3.4).

/// Article counts and name returned by a successful `GROUP` command,
/// parsed from `211 <count> <first> <last> <name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    /// Estimated number of articles in the group.
    pub count: u64,
    /// Reported number of the first article.
    pub first: u64,
    /// Reported number of the last article.
    pub last: u64,
    /// Newsgroup name.
    pub name: String,
}

impl GroupInfo {
    /// Parses the text following a `211` reply code.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Protocol`] if the line does not contain
    /// four whitespace-separated fields with numeric counts.
    pub fn parse(text: &str) -> crate::Result<Self> {
        let mut parts = text.split_whitespace();
        let count = parts.next().and_then(|s| s.parse().ok());
        let first = parts.next().and_then(|s| s.parse().ok());
        let last = parts.next().and_then(|s| s.parse().ok());
        let name = parts.next();

        match (count, first, last, name) {
            (Some(count), Some(first), Some(last), Some(name)) => Ok(Self {
                count,
                first,
                last,
                name: name.to_string(),
            }),
            _ => Err(crate::Error::Protocol(format!(
                "malformed GROUP response: {text:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_group_reply() {
        let info = GroupInfo::parse("42 1 42 comp.lang.rust").unwrap();
        assert_eq!(info.count, 42);
        assert_eq!(info.first, 1);
        assert_eq!(info.last, 42);
        assert_eq!(info.name, "comp.lang.rust");
    }

    #[test]
    fn rejects_short_line() {
        assert!(GroupInfo::parse("42 1 42").is_err());
    }
}
