//! NNTP command builder.

/// An NNTP command line, not yet CRLF-terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `MODE READER`
    ModeReader,
    /// `GROUP <name>`
    Group(String),
    /// `ARTICLE <spec>` (article number, `<message-id>`, or none for current).
    Article(Option<String>),
    /// `HEAD <spec>`
    Head(Option<String>),
    /// `BODY <spec>`
    Body(Option<String>),
    /// `STAT <spec>`
    Stat(Option<String>),
    /// `NEXT`
    Next,
    /// `LAST`
    Last,
    /// `XOVER <first>-<last>`
    XOver(u64, u64),
    /// `XHDR <field> <first>-<last>`
    XHdr(String, u64, u64),
    /// `LIST`
    List,
    /// `POST`
    Post,
    /// `AUTHINFO USER <user>`
    AuthInfoUser(String),
    /// `AUTHINFO PASS <pass>`
    AuthInfoPass(String),
    /// `QUIT`
    Quit,
}

impl Command {
    /// Serializes this command to a CRLF-terminated wire line.
    #[must_use]
    pub fn serialize(&self) -> String {
        match self {
            Self::ModeReader => "MODE READER\r\n".to_string(),
            Self::Group(name) => format!("GROUP {name}\r\n"),
            Self::Article(spec) => format!("ARTICLE{}\r\n", opt_arg(spec)),
            Self::Head(spec) => format!("HEAD{}\r\n", opt_arg(spec)),
            Self::Body(spec) => format!("BODY{}\r\n", opt_arg(spec)),
            Self::Stat(spec) => format!("STAT{}\r\n", opt_arg(spec)),
            Self::Next => "NEXT\r\n".to_string(),
            Self::Last => "LAST\r\n".to_string(),
            Self::XOver(first, last) => format!("XOVER {first}-{last}\r\n"),
            Self::XHdr(field, first, last) => format!("XHDR {field} {first}-{last}\r\n"),
            Self::List => "LIST\r\n".to_string(),
            Self::Post => "POST\r\n".to_string(),
            Self::AuthInfoUser(user) => format!("AUTHINFO USER {user}\r\n"),
            Self::AuthInfoPass(pass) => format!("AUTHINFO PASS {pass}\r\n"),
            Self::Quit => "QUIT\r\n".to_string(),
        }
    }
}

fn opt_arg(spec: &Option<String>) -> String {
    match spec {
        Some(s) => format!(" {s}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_serializes() {
        assert_eq!(
            Command::Group("comp.lang.rust".to_string()).serialize(),
            "GROUP comp.lang.rust\r\n"
        );
    }

    #[test]
    fn article_with_and_without_spec() {
        assert_eq!(Command::Article(None).serialize(), "ARTICLE\r\n");
        assert_eq!(
            Command::Article(Some("<id@x>".to_string())).serialize(),
            "ARTICLE <id@x>\r\n"
        );
    }

    #[test]
    fn xover_range() {
        assert_eq!(Command::XOver(1, 42).serialize(), "XOVER 1-42\r\n");
    }

    #[test]
    fn authinfo_pair() {
        assert_eq!(
            Command::AuthInfoUser("alice".to_string()).serialize(),
            "AUTHINFO USER alice\r\n"
        );
        assert_eq!(
            Command::AuthInfoPass("secret".to_string()).serialize(),
            "AUTHINFO PASS secret\r\n"
        );
    }
}
