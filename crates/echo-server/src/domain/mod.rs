//! Domain layer for echo-server.
//!
//! Pure types with no I/O: configuration, connection facts, the per-request
//! routing decision and WebSocket frame kinds.  Nothing in here touches
//! sockets, files or the process environment.

pub mod config;
pub mod connection;
pub mod frame;
pub mod request;

pub use config::{ServerConfig, TlsEndpoint};
pub use connection::{ConnectionInfo, TlsSummary, Transport};
pub use frame::{describe_frame, greeting, FrameKind};
pub use request::{is_websocket_upgrade, RequestKind, DEMO_PAGE_PATH};
