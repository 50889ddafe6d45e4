//! # mailcore-transport
//!
//! Shared transport substrate for the `mailcore` protocol clients: TCP
//! sockets, async DNS resolution, SOCKS4/5 proxying, and TLS (tunnel or
//! STARTTLS upgrade). `mailcore-imap`, `mailcore-nntp`, and `mailcore-smtp`
//! all sit on top of the same [`MailStream`] and [`Endpoint`] rather than
//! each re-deriving their own socket handling.
//!
//! ## Modules
//!
//! - [`endpoint`]: connection target description (`Endpoint`, `SocksDescriptor`, `TlsMode`)
//! - [`resolver`]: DNS resolution strategies
//! - [`socks`]: SOCKS4/SOCKS5 client handshakes
//! - [`stream`]: `MailStream` (plain/TLS) and the top-level `connect` orchestration
//! - [`session`]: abstract session state and the `SessionObserver` callback trait

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod endpoint;
pub mod error;
pub mod resolver;
pub mod session;
pub mod socks;
pub mod stream;

pub use endpoint::{Endpoint, SocksDescriptor, SocksType, TlsMode};
pub use error::{Error, Result};
pub use resolver::ResolverStrategy;
pub use session::{NullObserver, SessionObserver, SessionState, SessionTimers};
pub use stream::{MailStream, connect, create_tls_connector};
