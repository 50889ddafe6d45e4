//! NNTP reply codes (RFC 3977 §3.2) and the parsed reply they carry.

/// A parsed NNTP reply: a three-digit code plus the single status line
/// that follows it (`ARTICLE`/`HEAD`/`BODY`/`XOVER`/`POST` payloads are
/// consumed separately by the command that expects them).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Three-digit reply code.
    pub code: ReplyCode,
    /// Text following the code on the status line.
    pub text: String,
}

impl Reply {
    /// Creates a new reply.
    #[must_use]
    pub const fn new(code: ReplyCode, text: String) -> Self {
        Self { code, text }
    }
}

/// NNTP three-digit reply code (RFC 3977 §3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReplyCode(pub u16);

impl ReplyCode {
    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns true for a 1xx informational code.
    #[must_use]
    pub const fn is_informational(self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Returns true for a 2xx success code.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Returns true for a 3xx continuation code (more input expected).
    #[must_use]
    pub const fn is_continuation(self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    /// Returns true for a 4xx transient-failure code.
    #[must_use]
    pub const fn is_transient_failure(self) -> bool {
        self.0 >= 400 && self.0 < 500
    }

    /// Returns true for a 5xx permanent-failure code.
    #[must_use]
    pub const fn is_permanent_failure(self) -> bool {
        self.0 >= 500 && self.0 < 600
    }
}

impl std::fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Named reply codes used by this client, per spec §4.4 / §8 scenario 4.
impl ReplyCode {
    /// 200 Server ready, posting allowed.
    pub const POSTING_ALLOWED: Self = Self(200);
    /// 201 Server ready, no posting allowed.
    pub const POSTING_PROHIBITED: Self = Self(201);
    /// 211 Group selected.
    pub const GROUP_SELECTED: Self = Self(211);
    /// 215 List follows.
    pub const LIST_FOLLOWS: Self = Self(215);
    /// 220 Article follows (ARTICLE).
    pub const ARTICLE_FOLLOWS: Self = Self(220);
    /// 221 Head follows (HEAD).
    pub const HEAD_FOLLOWS: Self = Self(221);
    /// 222 Body follows (BODY).
    pub const BODY_FOLLOWS: Self = Self(222);
    /// 223 Article exists (STAT/NEXT/LAST), no text sent.
    pub const ARTICLE_SELECTED: Self = Self(223);
    /// 224 Overview information follows (XOVER).
    pub const OVERVIEW_FOLLOWS: Self = Self(224);
    /// 225 Headers follow (XHDR).
    pub const HEADERS_FOLLOW: Self = Self(225);
    /// 230 New article IDs follow (NEWNEWS) — not implemented.
    pub const NEW_ARTICLES_FOLLOW: Self = Self(230);
    /// 231 New newsgroups follow (NEWGROUPS) — not implemented.
    pub const NEW_GROUPS_FOLLOW: Self = Self(231);
    /// 235 Article transferred successfully.
    pub const TRANSFER_OK: Self = Self(235);
    /// 240 Article posted successfully.
    pub const POST_OK: Self = Self(240);
    /// 281 Authentication accepted.
    pub const AUTH_ACCEPTED: Self = Self(281);
    /// 335 Send article to be transferred.
    pub const TRANSFER_CONTINUE: Self = Self(335);
    /// 340 Send article to be posted.
    pub const POST_CONTINUE: Self = Self(340);
    /// 380 Continue with authentication.
    pub const AUTH_CONTINUE: Self = Self(380);
    /// 381 More authentication information required (AUTHINFO USER).
    pub const AUTH_CONTINUE_PASS: Self = Self(381);
    /// 400 Service not available.
    pub const SERVICE_UNAVAILABLE: Self = Self(400);
    /// 411 No such newsgroup.
    pub const NO_SUCH_GROUP: Self = Self(411);
    /// 412 No newsgroup selected.
    pub const NO_GROUP_SELECTED: Self = Self(412);
    /// 420 No current article selected.
    pub const NO_CURRENT_ARTICLE: Self = Self(420);
    /// 421 No next article.
    pub const NO_NEXT_ARTICLE: Self = Self(421);
    /// 422 No previous article.
    pub const NO_PREVIOUS_ARTICLE: Self = Self(422);
    /// 423 No such article number in this group.
    pub const NO_SUCH_ARTICLE_NUMBER: Self = Self(423);
    /// 430 No such article found.
    pub const NO_SUCH_ARTICLE: Self = Self(430);
    /// 435 Article not wanted.
    pub const ARTICLE_NOT_WANTED: Self = Self(435);
    /// 436 Transfer failed, try again later.
    pub const TRANSFER_FAILED: Self = Self(436);
    /// 437 Article rejected.
    pub const ARTICLE_REJECTED: Self = Self(437);
    /// 440 Posting not permitted.
    pub const POSTING_NOT_PERMITTED: Self = Self(440);
    /// 441 Posting failed.
    pub const POSTING_FAILED: Self = Self(441);
    /// 480 Authentication required.
    pub const AUTH_REQUIRED: Self = Self(480);
    /// 481 Authentication rejected.
    pub const AUTH_REJECTED: Self = Self(481);
    /// 482 Authentication command out of sequence.
    pub const AUTH_OUT_OF_SEQUENCE: Self = Self(482);
    /// 500 Command not recognized.
    pub const COMMAND_UNKNOWN: Self = Self(500);
    /// 501 Command syntax error.
    pub const SYNTAX_ERROR: Self = Self(501);
    /// 502 Command unavailable / permission denied.
    pub const COMMAND_UNAVAILABLE: Self = Self(502);
    /// 503 Program fault.
    pub const PROGRAM_FAULT: Self = Self(503);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(ReplyCode::POSTING_ALLOWED.is_success());
        assert!(ReplyCode::AUTH_CONTINUE_PASS.is_continuation());
        assert!(ReplyCode::AUTH_REQUIRED.is_transient_failure());
        assert!(ReplyCode::SYNTAX_ERROR.is_permanent_failure());
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", ReplyCode::GROUP_SELECTED), "211");
    }
}
