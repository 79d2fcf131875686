//! Shared setup for the echo-server integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use echo_server::domain::ServerConfig;
use echo_server::infrastructure::{
    build_router, spawn_listeners, AppState, ListenerHandles, SystemReporter,
};
use tokio::time::timeout;

/// A running server and the addresses it bound.
pub struct TestServer {
    pub plain: SocketAddr,
    pub handles: ListenerHandles,
}

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Loopback config on ephemeral ports using the bundled localhost certificate.
pub fn loopback_config(extra_headers: Vec<(String, String)>) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.plain_addr = "127.0.0.1:0".parse().unwrap();
    config.tls.bind_addr = "127.0.0.1:0".parse().unwrap();
    config.tls.cert_path = fixture("localhost.crt");
    config.tls.key_path = fixture("localhost.key");
    config.extra_headers = extra_headers;
    config
}

/// Starts both listeners and waits for the plain one to bind.
pub async fn start(config: ServerConfig) -> TestServer {
    let reporter = SystemReporter::new(config.extra_headers.clone());
    let router = build_router(AppState::new(Arc::new(reporter)));
    let mut handles = spawn_listeners(&config, router);

    let plain = timeout(Duration::from_secs(5), &mut handles.plain_bound)
        .await
        .expect("plain listener bound within timeout")
        .expect("plain listener bound");

    TestServer { plain, handles }
}
