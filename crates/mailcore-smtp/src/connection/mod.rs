//! SMTP connection management with type-state pattern.

mod client;
mod stream;

pub use client::{
    Authenticated, Client, Connected, Data, MailTransaction, RecipientAdded, SEND_PROGRESS_INTERVAL,
    SmtpConnection,
};
pub use stream::{SmtpStream, connect, connect_tls};

use crate::types::Extension;
use std::collections::HashSet;

/// Server capabilities from EHLO response.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// Server hostname from greeting.
    pub hostname: String,
    /// Supported extensions.
    pub extensions: HashSet<Extension>,
}

impl ServerInfo {
    /// Checks if the server supports an extension.
    #[must_use]
    pub fn supports(&self, ext: &Extension) -> bool {
        self.extensions.contains(ext)
    }

    /// Checks if STARTTLS is supported.
    #[must_use]
    pub fn supports_starttls(&self) -> bool {
        self.supports(&Extension::StartTls)
    }

    /// Returns the maximum message size, if advertised.
    #[must_use]
    pub fn max_message_size(&self) -> Option<usize> {
        for ext in &self.extensions {
            if let Extension::Size(size) = ext {
                return *size;
            }
        }
        None
    }

    /// Returns supported authentication mechanisms.
    #[must_use]
    pub fn auth_mechanisms(&self) -> Vec<crate::types::AuthMechanism> {
        for ext in &self.extensions {
            if let Extension::Auth(mechanisms) = ext {
                return mechanisms.clone();
            }
        }
        Vec::new()
    }

    /// Picks the strongest authentication mechanism this crate can
    /// actually drive, among those the server advertised: `CRAM-MD5 >
    /// PLAIN > LOGIN` (spec §4.5; `DIGEST-MD5` is recognised in the
    /// advertised list but never auto-selected, since no client
    /// implements that exchange).
    #[must_use]
    pub fn preferred_auth_mechanism(&self) -> Option<crate::types::AuthMechanism> {
        use crate::types::AuthMechanism;
        let offered = self.auth_mechanisms();
        [AuthMechanism::CramMd5, AuthMechanism::Plain, AuthMechanism::Login]
            .into_iter()
            .find(|m| offered.contains(m))
    }
}
