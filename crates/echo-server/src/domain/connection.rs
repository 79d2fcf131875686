//! Per-connection facts captured at accept time.

use std::fmt;
use std::net::SocketAddr;

/// What is known about an accepted connection before its first request is
/// read.  Every request served on that connection carries a copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub remote_addr: SocketAddr,
    pub transport: Transport,
}

/// The transport a connection arrived on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Plain,
    Tls(TlsSummary),
}

/// Negotiated TLS parameters, as far as the handshake produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsSummary {
    /// e.g. `TLSv1_3`
    pub protocol_version: Option<String>,
    /// e.g. `TLS13_AES_256_GCM_SHA384`
    pub cipher_suite: Option<String>,
    /// SNI host name sent by the client.
    pub server_name: Option<String>,
    pub alpn_protocol: Option<String>,
}

impl ConnectionInfo {
    pub fn plain(remote_addr: SocketAddr) -> Self {
        Self {
            remote_addr,
            transport: Transport::Plain,
        }
    }

    pub fn tls(remote_addr: SocketAddr, summary: TlsSummary) -> Self {
        Self {
            remote_addr,
            transport: Transport::Tls(summary),
        }
    }

    pub fn tls_summary(&self) -> Option<&TlsSummary> {
        match &self.transport {
            Transport::Plain => None,
            Transport::Tls(summary) => Some(summary),
        }
    }
}

impl fmt::Display for TlsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unknown = "unknown";
        writeln!(
            f,
            "  protocol: {}",
            self.protocol_version.as_deref().unwrap_or(unknown)
        )?;
        writeln!(
            f,
            "  cipher suite: {}",
            self.cipher_suite.as_deref().unwrap_or(unknown)
        )?;
        writeln!(
            f,
            "  server name: {}",
            self.server_name.as_deref().unwrap_or("none")
        )?;
        write!(
            f,
            "  alpn protocol: {}",
            self.alpn_protocol.as_deref().unwrap_or("none")
        )
    }
}
