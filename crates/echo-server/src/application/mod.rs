//! Application layer for echo-server.
//!
//! Knows *what* the server answers without knowing how bytes reach the wire:
//! the diagnostic report layout, the reporter seam the dispatcher calls, and
//! the demo page.
//!
//! # What does NOT belong here?
//!
//! - Listeners, TLS, hyper/axum types (infrastructure)
//! - Reading the environment or `/etc` files (infrastructure)

pub mod demo_page;
pub mod report;

pub use demo_page::{DEMO_PAGE_CONTENT_TYPE, DEMO_PAGE_HTML};
pub use report::{
    build_report, render_report, DiagnosticReport, DiagnosticReporter, HostFacts,
    RequestSnapshot, REPORT_CONTENT_TYPE,
};
