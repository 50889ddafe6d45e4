//! # mailcore-nntp
//!
//! An NNTP (RFC 3977) client: `GROUP`/`ARTICLE`/`HEAD`/`BODY`/`STAT`/`NEXT`,
//! `XOVER`/`XHDR` overview and header fetch, `POST`, `MODE READER`, and a
//! deferred `AUTHINFO USER`/`AUTHINFO PASS` exchange triggered by a `480`
//! challenge.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailcore_nntp::Client;
//! use mailcore_transport::Endpoint;
//!
//! #[tokio::main]
//! async fn main() -> mailcore_nntp::Result<()> {
//!     let endpoint = Endpoint::new("news.example.com", 119);
//!     let mut client = Client::connect(&endpoint, None).await?;
//!     client.mode_reader().await?;
//!     let group = client.group("comp.lang.rust", true).await?;
//!     let overview = client.xover(group.first, group.last).await?;
//!     for article in &overview {
//!         println!("{}: {}", article.number, article.subject);
//!     }
//!     client.quit().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`command`]: command builders
//! - [`connection`]: the session client and its transport-level stream
//! - [`parser`]: status-line and dot-terminated block parsing
//! - [`types`]: reply codes, group state, overview records

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::Command;
pub use connection::{Client, Credentials};
pub use error::{Error, NntpStatus, Result};
pub use types::{GroupInfo, OverviewLine, Reply, ReplyCode};
