//! # mailcore-codec
//!
//! Wire-format codecs shared by the `mailcore` protocol clients: Base64,
//! Quoted-Printable, and RFC 2047 header encoding; RFC 822 header folding
//! and parsing; the modified UTF-7 mailbox-name transform used by IMAP;
//! CRAM-MD5 challenge-response; and a compact IMAP sequence-set builder.
//! None of this assembles or parses full MIME message bodies — that is
//! explicitly out of scope for a session-protocol core.
//!
//! ## Modules
//!
//! - [`encoding`]: Base64, Quoted-Printable, RFC 2047
//! - [`header`]: RFC 822 header collection, folding, and parsing
//! - [`mutf7`]: modified UTF-7 (RFC 3501 §5.1.3) mailbox-name codec
//! - [`hmac_md5`]: CRAM-MD5 challenge-response (RFC 2195)
//! - [`seqset`]: compact, length-capped IMAP sequence-set string builder

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
mod header;

pub mod encoding;
pub mod hmac_md5;
pub mod mutf7;
pub mod seqset;

pub use error::{Error, Result};
pub use header::Headers;
pub use seqset::{COPY_UID_COUNT_CAP, MAX_SEQUENCE_SET_LEN, build_sequence_set};
