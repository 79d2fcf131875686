//! echo-server library crate.
//!
//! A diagnostic server for checking connectivity, load-balancer behaviour and
//! request routing.  Plain HTTP requests get a text report about the server
//! and the request; WebSocket connections get a greeting and then every
//! frame echoed back unchanged.
//!
//! # Architecture
//!
//! ```text
//! client ──► plain listener (:8080) ─┐
//!                                    ├─► dispatcher ─┬─► WebSocket echo session
//! client ──► TLS listener   (:8443) ─┘               ├─► /ws demo page
//!                                                    └─► diagnostic reporter
//!
//! [echo-server]
//!   ├── domain/           Pure types: config, connection facts, request
//!   │                     classification, frame kinds
//!   ├── application/      Report layout, reporter seam, demo page
//!   └── infrastructure/
//!         ├── listener/   Dual listeners and the fatal-error channel
//!         ├── tls/        rustls acceptor and TLS listener
//!         ├── dispatcher/ Per-request routing (axum)
//!         ├── ws_session/ Greeting + echo loop
//!         └── host/       Hostname, environment, /etc files
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no framework types.
//! - `application` depends on `domain` only.
//! - `infrastructure` depends on everything plus `tokio`, `axum` and
//!   `tokio-rustls`.

/// Domain layer: pure types (no I/O).
pub mod domain;

/// Application layer: report rendering and the reporter seam.
pub mod application;

/// Infrastructure layer: listeners, TLS, dispatcher, sessions.
pub mod infrastructure;
