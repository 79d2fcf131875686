//! Dual-listener runtime: one plain and one TLS endpoint feeding the same
//! router.
//!
//! The two endpoints fail differently and report on different paths:
//!
//! - **Plain**: any bind or serve error is sent on the `fatal` one-shot
//!   channel.  [`run_server`] waits on that channel and returns the error,
//!   which ends the process.
//! - **TLS**: missing key material or a bind error is logged and the TLS task
//!   ends.  Plain keeps serving.
//!
//! Both accept loops run until the process exits; there is no coordinated
//! shutdown.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context};
use axum::extract::connect_info::Connected;
use axum::serve::IncomingStream;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::domain::{ConnectionInfo, ServerConfig, TlsEndpoint};
use crate::infrastructure::dispatcher::{build_router, AppState};
use crate::infrastructure::host::SystemReporter;
use crate::infrastructure::tls::{load_tls_acceptor, summarize, TlsConfigError, TlsListener};

/// Which of the two listeners an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Plain,
    Tls,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Plain => f.write_str("plain"),
            Endpoint::Tls => f.write_str("TLS"),
        }
    }
}

/// Why a listener could not start or stopped serving.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to bind {endpoint} listener on {addr}: {source}")]
    Bind {
        endpoint: Endpoint,
        addr: SocketAddr,
        source: io::Error,
    },

    #[error(transparent)]
    TlsConfig(#[from] TlsConfigError),

    #[error("{endpoint} listener stopped: {source}")]
    Serve { endpoint: Endpoint, source: io::Error },
}

// ── Connection info ───────────────────────────────────────────────────────────

impl Connected<IncomingStream<'_, TcpListener>> for ConnectionInfo {
    fn connect_info(stream: IncomingStream<'_, TcpListener>) -> Self {
        ConnectionInfo::plain(*stream.remote_addr())
    }
}

impl Connected<IncomingStream<'_, TlsListener>> for ConnectionInfo {
    fn connect_info(stream: IncomingStream<'_, TlsListener>) -> Self {
        let (_, session) = stream.io().get_ref();
        ConnectionInfo::tls(*stream.remote_addr(), summarize(session))
    }
}

// ── Endpoints ─────────────────────────────────────────────────────────────────

/// Binds the plain listener.
pub async fn bind_plain(addr: SocketAddr) -> Result<TcpListener, ListenerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ListenerError::Bind {
            endpoint: Endpoint::Plain,
            addr,
            source,
        })
}

/// Loads the key material and binds the TLS listener.
pub async fn bind_tls(endpoint: &TlsEndpoint) -> Result<TlsListener, ListenerError> {
    let acceptor = load_tls_acceptor(&endpoint.cert_path, &endpoint.key_path).await?;
    let bind_error = |source| ListenerError::Bind {
        endpoint: Endpoint::Tls,
        addr: endpoint.bind_addr,
        source,
    };
    let listener = TcpListener::bind(endpoint.bind_addr)
        .await
        .map_err(bind_error)?;
    TlsListener::new(listener, acceptor).map_err(bind_error)
}

/// Serves `router` over plain HTTP until the listener fails.
pub async fn serve_plain(listener: TcpListener, router: Router) -> Result<(), ListenerError> {
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<ConnectionInfo>(),
    )
    .await
    .map_err(|source| ListenerError::Serve {
        endpoint: Endpoint::Plain,
        source,
    })
}

/// Serves `router` over TLS until the listener fails.
pub async fn serve_tls(listener: TlsListener, router: Router) -> Result<(), ListenerError> {
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<ConnectionInfo>(),
    )
    .await
    .map_err(|source| ListenerError::Serve {
        endpoint: Endpoint::Tls,
        source,
    })
}

// ── Runtime ───────────────────────────────────────────────────────────────────

/// Handles to the two listener tasks started by [`spawn_listeners`].
pub struct ListenerHandles {
    /// Receives the error that stopped the plain listener.  Closed without a
    /// value if the plain listener ends cleanly.
    pub fatal: oneshot::Receiver<ListenerError>,
    /// The plain listener's bound address, once bound.
    pub plain_bound: oneshot::Receiver<SocketAddr>,
    /// The TLS listener's bound address; closed without a value if TLS could
    /// not be brought up.
    pub tls_bound: oneshot::Receiver<SocketAddr>,
    pub plain: JoinHandle<()>,
    pub tls: JoinHandle<()>,
}

/// Starts the plain and TLS listeners as two independent tasks sharing
/// `router`.
pub fn spawn_listeners(config: &ServerConfig, router: Router) -> ListenerHandles {
    let (fatal_tx, fatal) = oneshot::channel();
    let (plain_bound_tx, plain_bound) = oneshot::channel();
    let (tls_bound_tx, tls_bound) = oneshot::channel();

    let plain_addr = config.plain_addr;
    let plain_router = router.clone();
    let plain = tokio::spawn(async move {
        let result = async {
            let listener = bind_plain(plain_addr).await?;
            let local = listener.local_addr().unwrap_or(plain_addr);
            info!("echo server starting on {local}");
            let _ = plain_bound_tx.send(local);
            serve_plain(listener, plain_router).await
        }
        .await;

        if let Err(e) = result {
            // The receiver only goes away when the process is shutting down.
            let _ = fatal_tx.send(e);
        }
    });

    let tls_endpoint = config.tls.clone();
    let tls = tokio::spawn(async move {
        let result = async {
            let listener = bind_tls(&tls_endpoint).await?;
            let local = axum::serve::Listener::local_addr(&listener)
                .unwrap_or(tls_endpoint.bind_addr);
            info!("echo server starting on TLS port {local}");
            let _ = tls_bound_tx.send(local);
            serve_tls(listener, router).await
        }
        .await;

        if let Err(e) = result {
            error!("failed to serve TLS: {e}");
        }
    });

    ListenerHandles {
        fatal,
        plain_bound,
        tls_bound,
        plain,
        tls,
    }
}

/// Runs the echo server until the plain listener fails or Ctrl+C arrives.
///
/// # Errors
///
/// Returns the plain listener's error.  TLS failures never end up here.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let reporter = SystemReporter::new(config.extra_headers.clone());
    let router = build_router(AppState::new(Arc::new(reporter)));
    let handles = spawn_listeners(&config, router);

    wait_for_exit(handles.fatal).await
}

/// Waits for the plain listener to fail or for Ctrl+C.
///
/// A `fatal` channel closed without a value means the plain task ended
/// without reporting, e.g. by panicking; that is an error too.
async fn wait_for_exit(fatal: oneshot::Receiver<ListenerError>) -> anyhow::Result<()> {
    tokio::select! {
        fatal = fatal => match fatal {
            Ok(e) => {
                error!("could not start serving: {e}");
                Err(e).context("plain listener failed")
            }
            Err(_) => {
                error!("plain listener stopped unexpectedly");
                bail!("plain listener stopped unexpectedly")
            }
        },
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("received Ctrl+C, shutting down"),
                Err(e) => error!("failed to listen for Ctrl+C: {e}"),
            }
            Ok(())
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
