//! Request classification.
//!
//! Every inbound request is classified exactly once, before any handler runs,
//! into a [`RequestKind`].  The value is immutable: a connection can only be
//! upgraded because its request was classified as an upgrade, so there is no
//! connection-level "upgraded" flag to race on.

/// The path that serves the interactive WebSocket demo page.
pub const DEMO_PAGE_PATH: &str = "/ws";

/// Where a request is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// The request asks to switch to the WebSocket protocol.  Takes priority
    /// over the path: `/anything` with upgrade headers is still a WebSocket.
    WebSocketUpgrade,
    /// A plain request for [`DEMO_PAGE_PATH`].
    DemoPage,
    /// Everything else goes to the diagnostic reporter.
    Diagnostic,
}

impl RequestKind {
    /// Classifies a request from its path and its `Connection` and `Upgrade`
    /// header values.
    ///
    /// The origin of the request is not inspected.
    ///
    /// # Example
    ///
    /// ```rust
    /// use echo_server::domain::RequestKind;
    ///
    /// let kind = RequestKind::classify("/anything", ["keep-alive, Upgrade"], ["websocket"]);
    /// assert_eq!(kind, RequestKind::WebSocketUpgrade);
    ///
    /// let kind = RequestKind::classify("/ws", [], []);
    /// assert_eq!(kind, RequestKind::DemoPage);
    /// ```
    pub fn classify<'a>(
        path: &str,
        connection: impl IntoIterator<Item = &'a str>,
        upgrade: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        if is_websocket_upgrade(connection, upgrade) {
            Self::WebSocketUpgrade
        } else if path == DEMO_PAGE_PATH {
            Self::DemoPage
        } else {
            Self::Diagnostic
        }
    }
}

/// Returns `true` when the `Connection` values contain the `upgrade` token and
/// the `Upgrade` values contain the `websocket` token.
///
/// Only the upgrade signalling is checked here.  Whether the handshake itself
/// is well formed (key, version, method) is decided when the upgrade is
/// performed, so a malformed handshake still reaches the session handler and
/// is logged there.
pub fn is_websocket_upgrade<'a>(
    connection: impl IntoIterator<Item = &'a str>,
    upgrade: impl IntoIterator<Item = &'a str>,
) -> bool {
    contains_token(connection, "upgrade") && contains_token(upgrade, "websocket")
}

/// Searches comma-separated header values for `token`, ignoring ASCII case and
/// surrounding whitespace.
fn contains_token<'a>(values: impl IntoIterator<Item = &'a str>, token: &str) -> bool {
    values
        .into_iter()
        .flat_map(|value| value.split(','))
        .any(|candidate| candidate.trim().eq_ignore_ascii_case(token))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
