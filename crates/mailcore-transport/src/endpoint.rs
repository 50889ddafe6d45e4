//! Connection endpoint description (spec §3.1 `SocketEndpoint`).

use std::time::Duration;

use crate::resolver::ResolverStrategy;

/// SOCKS proxy flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocksType {
    /// SOCKS4 (no authentication, IPv4 only).
    Socks4,
    /// SOCKS5 (optional username/password sub-negotiation, RFC 1929).
    Socks5,
}

/// Proxy descriptor attached to an [`Endpoint`].
#[derive(Debug, Clone)]
pub struct SocksDescriptor {
    /// Proxy protocol flavor.
    pub kind: SocksType,
    /// Proxy hostname.
    pub host: String,
    /// Proxy port.
    pub port: u16,
    /// Optional username for SOCKS5 sub-negotiation.
    pub username: Option<String>,
    /// Optional password for SOCKS5 sub-negotiation.
    pub password: Option<String>,
}

/// How (and whether) TLS is layered onto the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsMode {
    /// No encryption.
    #[default]
    None,
    /// TLS immediately after TCP connect (e.g. IMAPS, SMTPS, NNTPS).
    Tunnel,
    /// Plaintext first, upgraded via a protocol-specific STARTTLS command.
    StartTls,
}

/// A fully-specified connection target: host/port, optional SOCKS proxy,
/// optional TLS mode, and the timeouts/resolver strategy to use while
/// opening it. Consumed by [`crate::connect`]; owned by the `Session`
/// until `close`.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Target server hostname.
    pub host: String,
    /// Target server port.
    pub port: u16,
    /// Optional SOCKS4/5 proxy to tunnel the TCP connection through.
    pub socks: Option<SocksDescriptor>,
    /// TLS mode.
    pub tls: TlsMode,
    /// DNS resolution strategy.
    pub resolver: ResolverStrategy,
    /// Timeout applied to the connect attempt (including DNS + SOCKS + TLS
    /// tunnel handshake).
    pub connect_timeout: Duration,
    /// Timeout applied to each subsequent read/write.
    pub io_timeout: Duration,
}

impl Endpoint {
    /// Creates a plain endpoint with sensible defaults (no proxy, no TLS,
    /// blocking-strategy resolver, 30s connect / 60s I/O timeouts).
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            socks: None,
            tls: TlsMode::None,
            resolver: ResolverStrategy::default(),
            connect_timeout: Duration::from_secs(30),
            io_timeout: Duration::from_secs(60),
        }
    }

    /// Sets the TLS mode.
    #[must_use]
    pub const fn with_tls(mut self, mode: TlsMode) -> Self {
        self.tls = mode;
        self
    }

    /// Attaches a SOCKS proxy descriptor.
    #[must_use]
    pub fn with_socks(mut self, socks: SocksDescriptor) -> Self {
        self.socks = Some(socks);
        self
    }

    /// Overrides the resolver strategy.
    #[must_use]
    pub const fn with_resolver(mut self, strategy: ResolverStrategy) -> Self {
        self.resolver = strategy;
        self
    }
}
