//! echo-server: entry point.
//!
//! Serves the diagnostic report and the WebSocket echo on two ports, plain
//! HTTP and HTTPS.  Only the plain port is required; if the TLS certificate
//! is missing the server logs it and carries on without TLS.
//!
//! # Usage
//!
//! ```text
//! echo-server [OPTIONS]
//!
//! Options:
//!   --port        <PORT>  Plain HTTP port               [default: 8080]
//!   --ssl-port    <PORT>  TLS port                      [default: 8443]
//!   --bind        <IP>    Address both listeners bind   [default: 0.0.0.0]
//!   --tls-cert    <PATH>  PEM certificate chain         [default: /etc/tlssecret/client.crt]
//!   --tls-key     <PATH>  PEM private key               [default: /etc/tlssecret/client.key]
//!   --add-headers <JSON>  Extra headers for the report, e.g. '{"X-Env":"dev"}'
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable      | Default                      |
//! |---------------|------------------------------|
//! | `PORT`        | `8080`                       |
//! | `SSLPORT`     | `8443`                       |
//! | `BIND_ADDR`   | `0.0.0.0`                    |
//! | `TLS_CERT`    | `/etc/tlssecret/client.crt`  |
//! | `TLS_KEY`     | `/etc/tlssecret/client.key`  |
//! | `ADD_HEADERS` | unset                        |
//!
//! Logging is controlled with `RUST_LOG` (default `info`).

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{bail, Context};
use axum::http::{HeaderName, HeaderValue};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use echo_server::domain::config::{DEFAULT_TLS_CERT_PATH, DEFAULT_TLS_KEY_PATH};
use echo_server::domain::{ServerConfig, TlsEndpoint};
use echo_server::infrastructure::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Diagnostic HTTP and WebSocket echo server.
#[derive(Debug, Parser)]
#[command(
    name = "echo-server",
    about = "Diagnostic HTTP and WebSocket echo server",
    version
)]
struct Cli {
    /// Plain HTTP port.  The server exits if it cannot listen here.
    #[arg(long, default_value_t = 8080, env = "PORT")]
    port: u16,

    /// HTTPS port.  Failing to listen here is logged but not fatal.
    #[arg(long, default_value_t = 8443, env = "SSLPORT")]
    ssl_port: u16,

    /// IP address both listeners bind to.
    #[arg(long, default_value = "0.0.0.0", env = "BIND_ADDR")]
    bind: String,

    /// PEM file with the TLS certificate chain.
    #[arg(long, default_value = DEFAULT_TLS_CERT_PATH, env = "TLS_CERT")]
    tls_cert: PathBuf,

    /// PEM file with the TLS private key.
    #[arg(long, default_value = DEFAULT_TLS_KEY_PATH, env = "TLS_KEY")]
    tls_key: PathBuf,

    /// JSON object of extra headers added to every diagnostic report,
    /// e.g. `{"X-Served-By":"blue"}`.
    #[arg(long, env = "ADD_HEADERS")]
    add_headers: Option<String>,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--bind` is not an IP address or `--add-headers`
    /// is not a JSON object of valid header names and values.
    fn into_server_config(self) -> anyhow::Result<ServerConfig> {
        let ip: IpAddr = self
            .bind
            .parse()
            .with_context(|| format!("invalid bind address: '{}'", self.bind))?;

        let extra_headers = match self.add_headers.as_deref() {
            Some(json) if !json.trim().is_empty() => {
                parse_extra_headers(json).context("invalid ADD_HEADERS")?
            }
            _ => Vec::new(),
        };

        Ok(ServerConfig {
            plain_addr: SocketAddr::new(ip, self.port),
            tls: TlsEndpoint {
                bind_addr: SocketAddr::new(ip, self.ssl_port),
                cert_path: self.tls_cert,
                key_path: self.tls_key,
            },
            extra_headers,
        })
    }
}

/// Parses a JSON object into `(name, value)` header pairs.
///
/// Entries whose value is not a string are skipped with a warning.
fn parse_extra_headers(json: &str) -> anyhow::Result<Vec<(String, String)>> {
    let object: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(json).context("expected a JSON object")?;

    let mut headers = Vec::with_capacity(object.len());
    for (name, value) in object {
        let serde_json::Value::String(value) = value else {
            warn!("ignoring extra header {name:?}: value is not a string");
            continue;
        };
        if HeaderName::try_from(name.as_str()).is_err() {
            bail!("invalid header name {name:?}");
        }
        if HeaderValue::try_from(value.as_str()).is_err() {
            bail!("invalid value for header {name:?}");
        }
        headers.push((name, value));
    }
    Ok(headers)
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `RUST_LOG` overrides the default `info` level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_server_config()?;

    info!(
        "echo-server starting: plain={}, tls={}",
        config.plain_addr, config.tls.bind_addr
    );

    // Returns only when the plain listener fails or on Ctrl+C.
    run_server(config).await?;

    info!("echo-server stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(add_headers: Option<&str>) -> Cli {
        Cli {
            port: 8080,
            ssl_port: 8443,
            bind: "0.0.0.0".to_string(),
            tls_cert: PathBuf::from(DEFAULT_TLS_CERT_PATH),
            tls_key: PathBuf::from(DEFAULT_TLS_KEY_PATH),
            add_headers: add_headers.map(str::to_owned),
        }
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["echo-server"]);
        assert_eq!(cli.port, 8080);
        assert_eq!(cli.ssl_port, 8443);
        assert_eq!(cli.bind, "0.0.0.0");
        assert_eq!(cli.tls_cert, PathBuf::from("/etc/tlssecret/client.crt"));
        assert_eq!(cli.tls_key, PathBuf::from("/etc/tlssecret/client.key"));
        assert!(cli.add_headers.is_none());
    }

    #[test]
    fn test_cli_port_overrides() {
        let cli = Cli::parse_from(["echo-server", "--port", "9000", "--ssl-port", "9443"]);
        assert_eq!(cli.port, 9000);
        assert_eq!(cli.ssl_port, 9443);
    }

    #[test]
    fn test_cli_tls_path_overrides() {
        let cli = Cli::parse_from([
            "echo-server",
            "--tls-cert",
            "/run/certs/tls.crt",
            "--tls-key",
            "/run/certs/tls.key",
        ]);
        assert_eq!(cli.tls_cert, PathBuf::from("/run/certs/tls.crt"));
        assert_eq!(cli.tls_key, PathBuf::from("/run/certs/tls.key"));
    }

    #[test]
    fn test_default_cli_matches_default_config() {
        let config = cli(None).into_server_config().unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_bind_address_applies_to_both_listeners() {
        let mut args = cli(None);
        args.bind = "127.0.0.1".to_string();
        args.port = 18080;
        args.ssl_port = 18443;

        let config = args.into_server_config().unwrap();

        assert_eq!(config.plain_addr.to_string(), "127.0.0.1:18080");
        assert_eq!(config.tls.bind_addr.to_string(), "127.0.0.1:18443");
    }

    #[test]
    fn test_ipv6_bind_address() {
        let mut args = cli(None);
        args.bind = "::".to_string();
        let config = args.into_server_config().unwrap();
        assert_eq!(config.plain_addr.to_string(), "[::]:8080");
    }

    #[test]
    fn test_invalid_bind_address_returns_error() {
        let mut args = cli(None);
        args.bind = "not.an.ip".to_string();
        assert!(args.into_server_config().is_err());
    }

    #[test]
    fn test_add_headers_parsed_into_config() {
        let config = cli(Some(r#"{"X-Served-By":"blue","X-Env":"dev"}"#))
            .into_server_config()
            .unwrap();
        assert_eq!(config.extra_headers.len(), 2);
        assert!(config
            .extra_headers
            .contains(&("X-Served-By".to_string(), "blue".to_string())));
        assert!(config
            .extra_headers
            .contains(&("X-Env".to_string(), "dev".to_string())));
    }

    #[test]
    fn test_blank_add_headers_is_ignored() {
        let config = cli(Some("  ")).into_server_config().unwrap();
        assert!(config.extra_headers.is_empty());
    }

    #[test]
    fn test_add_headers_must_be_json_object() {
        assert!(cli(Some("[1, 2]")).into_server_config().is_err());
        assert!(cli(Some("{not json")).into_server_config().is_err());
    }

    #[test]
    fn test_non_string_header_values_are_skipped() {
        let headers = parse_extra_headers(r#"{"X-Count":3,"X-Name":"a"}"#).unwrap();
        assert_eq!(headers, vec![("X-Name".to_string(), "a".to_string())]);
    }

    #[test]
    fn test_invalid_header_name_is_rejected() {
        let err = parse_extra_headers(r#"{"Bad Header":"x"}"#).unwrap_err();
        assert!(err.to_string().contains("Bad Header"));
    }
}
