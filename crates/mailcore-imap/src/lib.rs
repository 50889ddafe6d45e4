//! # mailcore-imap
//!
//! IMAP4rev1 (RFC 3501) client for the mail-protocol session core: greeting
//! and capability negotiation, LOGIN/CRAM-MD5/PLAIN authentication,
//! NAMESPACE, folder-tree `LIST` synchronisation, `SELECT`/`EXAMINE`/
//! `STATUS`, UID `SEARCH`/`FETCH`, `APPEND` (with `APPENDUID`), UID
//! `COPY`/`STORE`, `EXPUNGE`, `CLOSE`, and `LOGOUT`.
//!
//! ## Features
//!
//! - **Type-state connection management**: compile-time enforcement of valid
//!   IMAP state transitions (`NotAuthenticated` → `Authenticated` → `Selected`)
//! - **Full protocol support**: LOGIN, SELECT, FETCH, STORE, COPY, MOVE,
//!   SEARCH, APPEND, EXPUNGE, and more
//! - **TLS via rustls**: secure connections without an OpenSSL dependency,
//!   in both tunnel and `STARTTLS` modes
//! - **Server quirks handling**: built-in workarounds for Gmail, Outlook,
//!   Dovecot, and other common servers
//! - **Sans-I/O parser**: protocol parsing separated from network I/O
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailcore_imap::{Client, Config, Security, FetchItems};
//!
//! #[tokio::main]
//! async fn main() -> mailcore_imap::Result<()> {
//!     // Connect with TLS
//!     let config = Config::new("imap.example.com", Security::Implicit);
//!     let stream = mailcore_transport::connect(&config.endpoint()).await?;
//!     let client = Client::from_stream(stream).await?;
//!
//!     // Authenticate
//!     let mut client = client.login("user@example.com", "password").await?;
//!
//!     // List folders
//!     let folders = client.list("", "*").await?;
//!     for folder in &folders {
//!         println!("Folder: {}", folder.mailbox.as_str());
//!     }
//!
//!     // Select INBOX
//!     let (mut client, status) = client.select("INBOX").await?;
//!     println!("Messages: {}", status.exists);
//!
//!     // Fetch message headers
//!     let messages = client.fetch(
//!         &mailcore_imap::SequenceSet::range(1, 10).unwrap(),
//!         FetchItems::Fast,
//!     ).await?;
//!
//!     client.logout().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Connection States
//!
//! The library uses the type-state pattern to enforce valid IMAP operations
//! at compile time:
//!
//! ```text
//! ┌─────────────────────┐
//! │   NotAuthenticated  │ ─── login() ───→ Authenticated
//! └─────────────────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │    Authenticated    │ ─── select()/examine() ───→ Selected
//! └─────────────────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │      Selected       │ ─── close() ───→ Authenticated
//! └─────────────────────┘
//! ```
//!
//! IMAP IDLE, CONDSTORE, and QRESYNC are out of scope: this client targets
//! a single long-lived request/response session, not server-push
//! notification.
//!
//! ## Modules
//!
//! - [`command`]: IMAP command builders and types
//! - [`connection`]: Connection management and type-state client
//! - [`parser`]: Sans-I/O response parser
//! - [`quirks`]: Server-specific workarounds
//! - [`types`]: Core IMAP types (flags, mailboxes, sequences, etc.)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod fetch;
pub mod parser;
pub mod quirks;
pub mod stream_fetch;
pub mod sync;
pub mod types;

pub use command::{Command, FetchAttribute, FetchItems, SearchCriteria, StoreAction, TagGenerator};
pub use connection::{
    Authenticated, AuthMechanism, Client, Config, ConfigBuilder, FramedStream, ImapStream,
    NotAuthenticated, ResponseAccumulator, Security, Selected,
};
pub use error::{Error, Result};
pub use parser::{Response, ResponseParser, UntaggedResponse};
pub use quirks::{ServerQuirks, ServerType};
pub use sync::{
    CacheReconciliation, CachedMessage, DecodedListEntry, FolderNode, decode_list_responses,
    reconcile_folder_tree, reconcile_uid_cache, synthesize_intermediate_parents,
};
pub use types::{
    Capability, Flag, Flags, ListResponse, Mailbox, MailboxAttribute, MailboxStatus, Namespace,
    NamespaceDescriptor, ResponseCode, SeqNum, SequenceSet, Status, Tag, Uid, UidSet, UidValidity,
};

/// IMAP protocol version implemented.
pub const IMAP_VERSION: &str = "IMAP4rev1";
