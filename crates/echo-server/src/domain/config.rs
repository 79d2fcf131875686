//! Server configuration types.
//!
//! [`ServerConfig`] is the single source of truth for all runtime settings.
//! It is built once at startup from CLI arguments and environment variables
//! (see `main.rs`) and is never mutated afterwards; both listeners and every
//! request handler share it read-only behind an `Arc`.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Certificate chain used by the TLS listener when nothing else is configured.
pub const DEFAULT_TLS_CERT_PATH: &str = "/etc/tlssecret/client.crt";

/// Private key used by the TLS listener when nothing else is configured.
pub const DEFAULT_TLS_KEY_PATH: &str = "/etc/tlssecret/client.key";

/// All runtime configuration for the echo server.
///
/// # Example
///
/// ```rust
/// use echo_server::domain::ServerConfig;
///
/// let cfg = ServerConfig::default();
/// assert_eq!(cfg.plain_addr.port(), 8080);
/// assert_eq!(cfg.tls.bind_addr.port(), 8443);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address of the plain HTTP listener.  Failing to bind it is fatal.
    pub plain_addr: SocketAddr,

    /// The TLS-terminated listener.  Failing to bring it up is only logged.
    pub tls: TlsEndpoint,

    /// Headers attached to every diagnostic report response, in the order
    /// they were configured.
    pub extra_headers: Vec<(String, String)>,
}

/// Bind address and key material of the encrypted listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsEndpoint {
    pub bind_addr: SocketAddr,

    /// PEM file holding the certificate chain, leaf first.
    pub cert_path: PathBuf,

    /// PEM file holding the private key (PKCS#8, PKCS#1 or SEC1).
    pub key_path: PathBuf,
}

impl Default for ServerConfig {
    /// | Field              | Default                      |
    /// |--------------------|------------------------------|
    /// | plain_addr         | `0.0.0.0:8080`               |
    /// | tls.bind_addr      | `0.0.0.0:8443`               |
    /// | tls.cert_path      | `/etc/tlssecret/client.crt`  |
    /// | tls.key_path       | `/etc/tlssecret/client.key`  |
    /// | extra_headers      | none                         |
    fn default() -> Self {
        Self {
            plain_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            tls: TlsEndpoint {
                bind_addr: SocketAddr::from(([0, 0, 0, 0], 8443)),
                cert_path: PathBuf::from(DEFAULT_TLS_CERT_PATH),
                key_path: PathBuf::from(DEFAULT_TLS_KEY_PATH),
            },
            extra_headers: Vec::new(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
