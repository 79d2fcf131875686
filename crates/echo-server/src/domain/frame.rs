//! WebSocket data frame kinds and the session greeting.

use std::fmt;

/// The kind of a WebSocket data frame.  An echo always keeps the kind of the
/// frame it answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Text,
    Binary,
}

impl FrameKind {
    /// Short tag used in session log lines (`txt` / `bin`).
    pub fn tag(self) -> &'static str {
        match self {
            FrameKind::Text => "txt",
            FrameKind::Binary => "bin",
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Log summary of a received frame: text payloads are shown as-is, binary
/// payloads only by length.
///
/// ```rust
/// use echo_server::domain::{describe_frame, FrameKind};
///
/// assert_eq!(describe_frame(FrameKind::Text, b"hello"), "txt | hello");
/// assert_eq!(describe_frame(FrameKind::Binary, &[0, 1, 2]), "bin | 3 byte(s)");
/// ```
pub fn describe_frame(kind: FrameKind, payload: &[u8]) -> String {
    match kind {
        FrameKind::Text => format!("{kind} | {}", String::from_utf8_lossy(payload)),
        FrameKind::Binary => format!("{kind} | {} byte(s)", payload.len()),
    }
}

/// Builds the text of the single greeting frame sent after an upgrade.
///
/// `hostname` is the outcome of resolving the server's hostname; on failure
/// the error's description is included instead.
pub fn greeting<E: fmt::Display>(hostname: Result<&str, E>) -> String {
    match hostname {
        Ok(host) => format!("Request served by {host}"),
        Err(e) => format!("Server hostname unknown: {e}"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
