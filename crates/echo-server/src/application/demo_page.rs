//! The static page served at `/ws` for plain (non-upgrade) requests.
//!
//! Its script opens a WebSocket back to `/ws` on the same host, `wss://` when
//! the page itself was loaded over TLS.

pub const DEMO_PAGE_HTML: &str = include_str!("../../static/ws.html");

pub const DEMO_PAGE_CONTENT_TYPE: &str = "text/html";
