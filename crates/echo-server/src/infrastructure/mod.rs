//! Infrastructure layer for echo-server.
//!
//! Handles all I/O: binding the two listeners, terminating TLS, serving HTTP,
//! completing WebSocket upgrades, and reading host facts.
//!
//! # Responsibilities
//!
//! - Binding the plain and TLS listeners and reporting their failures
//! - Loading certificate and key files
//! - Classifying and routing each request
//! - Running one echo session task per upgraded connection
//! - Reading hostname, environment and `/etc` files for the report
//!
//! # What does NOT belong here?
//!
//! - The report layout (application layer)
//! - Configuration parsing (done in `main.rs`)

pub mod dispatcher;
pub mod host;
pub mod listener;
pub mod tls;
pub mod ws_session;

pub use dispatcher::{build_router, AppState};
pub use host::SystemReporter;
pub use listener::{run_server, spawn_listeners, ListenerError, ListenerHandles};
