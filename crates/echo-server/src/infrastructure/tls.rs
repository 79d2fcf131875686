//! TLS termination for the encrypted listener.
//!
//! [`load_tls_acceptor`] builds a rustls server configuration from PEM files,
//! and [`TlsListener`] plugs a TLS-terminating accept loop into `axum::serve`.
//!
//! Handshakes run in their own tasks so a slow or stalled client cannot hold
//! up the accept loop; only completed handshakes are handed to the server.

use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::serve::Listener;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_rustls::rustls::crypto::ring;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::{self, ServerConfig as RustlsServerConfig, ServerConnection};
use tokio_rustls::server::TlsStream;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, error, warn};

use crate::domain::TlsSummary;

/// Upper bound on one TLS handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Completed handshakes waiting for `axum::serve` to pick them up.
const ACCEPT_QUEUE: usize = 64;

/// Why the TLS key material could not be turned into an acceptor.
#[derive(Debug, Error)]
pub enum TlsConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("malformed PEM in {}: {source}", .path.display())]
    Pem { path: PathBuf, source: io::Error },

    #[error("no certificates found in {}", .0.display())]
    NoCertificates(PathBuf),

    #[error("no private key found in {}", .0.display())]
    NoPrivateKey(PathBuf),

    #[error("rejected certificate or key: {0}")]
    Rustls(#[from] rustls::Error),
}

/// Loads a certificate chain and private key and builds a [`TlsAcceptor`]
/// that offers HTTP/1.1 over ALPN.
///
/// # Errors
///
/// Fails when either file is unreadable, holds no usable PEM item, or the key
/// does not match the certificate.
pub async fn load_tls_acceptor(
    cert_path: &Path,
    key_path: &Path,
) -> Result<TlsAcceptor, TlsConfigError> {
    let cert_pem = read_file(cert_path).await?;
    let key_pem = read_file(key_path).await?;

    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut &*cert_pem)
        .collect::<Result<_, _>>()
        .map_err(|source| TlsConfigError::Pem {
            path: cert_path.to_path_buf(),
            source,
        })?;
    if certs.is_empty() {
        return Err(TlsConfigError::NoCertificates(cert_path.to_path_buf()));
    }

    let key: PrivateKeyDer<'static> = rustls_pemfile::private_key(&mut &*key_pem)
        .map_err(|source| TlsConfigError::Pem {
            path: key_path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| TlsConfigError::NoPrivateKey(key_path.to_path_buf()))?;

    let mut config = RustlsServerConfig::builder_with_provider(Arc::new(ring::default_provider()))
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(TlsAcceptor::from(Arc::new(config)))
}

async fn read_file(path: &Path) -> Result<Vec<u8>, TlsConfigError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| TlsConfigError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Extracts the negotiated parameters of a finished handshake.
pub fn summarize(connection: &ServerConnection) -> TlsSummary {
    TlsSummary {
        protocol_version: connection.protocol_version().map(|v| format!("{v:?}")),
        cipher_suite: connection
            .negotiated_cipher_suite()
            .map(|suite| format!("{:?}", suite.suite())),
        server_name: connection.server_name().map(str::to_owned),
        alpn_protocol: connection
            .alpn_protocol()
            .map(|p| String::from_utf8_lossy(p).into_owned()),
    }
}

// ── Listener ──────────────────────────────────────────────────────────────────

/// A TCP listener that yields TLS streams to `axum::serve`.
pub struct TlsListener {
    local_addr: SocketAddr,
    ready: mpsc::Receiver<(TlsStream<TcpStream>, SocketAddr)>,
}

impl TlsListener {
    /// Starts accepting on `listener`, terminating TLS with `acceptor`.
    ///
    /// Failed handshakes are logged and dropped; they never reach the
    /// dispatcher.
    pub fn new(listener: TcpListener, acceptor: TlsAcceptor) -> io::Result<Self> {
        let local_addr = listener.local_addr()?;
        let (tx, ready) = mpsc::channel(ACCEPT_QUEUE);
        tokio::spawn(accept_loop(listener, acceptor, tx));
        Ok(Self { local_addr, ready })
    }
}

async fn accept_loop(
    listener: TcpListener,
    acceptor: TlsAcceptor,
    tx: mpsc::Sender<(TlsStream<TcpStream>, SocketAddr)>,
) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                // Usually EMFILE; back off instead of spinning.
                error!("TLS accept error: {e}");
                tokio::time::sleep(Duration::from_millis(100)).await;
                continue;
            }
        };

        let acceptor = acceptor.clone();
        let task_tx = tx.clone();
        tokio::spawn(async move {
            match timeout(HANDSHAKE_TIMEOUT, acceptor.accept(stream)).await {
                Ok(Ok(tls_stream)) => {
                    if task_tx.send((tls_stream, peer)).await.is_err() {
                        debug!("{peer} | TLS listener gone, dropping connection");
                    }
                }
                Ok(Err(e)) => warn!("{peer} | TLS handshake failed: {e}"),
                Err(_) => warn!("{peer} | TLS handshake timed out"),
            }
        });

        if tx.is_closed() {
            debug!("TLS listener dropped, stopping accept loop");
            break;
        }
    }
}

impl Listener for TlsListener {
    type Io = TlsStream<TcpStream>;
    type Addr = SocketAddr;

    async fn accept(&mut self) -> (Self::Io, Self::Addr) {
        match self.ready.recv().await {
            Some(accepted) => accepted,
            // The accept loop only stops once this listener is dropped.
            None => std::future::pending().await,
        }
    }

    fn local_addr(&self) -> io::Result<Self::Addr> {
        Ok(self.local_addr)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
