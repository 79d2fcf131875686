//! Protocol dispatcher: one handler for every request on both listeners.
//!
//! Each request is logged, classified once into a [`RequestKind`], and then
//! served by exactly one of:
//!
//! - the WebSocket echo session (upgrade headers present, any path);
//! - the static demo page (`/ws` without upgrade headers);
//! - the diagnostic reporter (everything else).
//!
//! Nothing is rejected here; a malformed WebSocket handshake is answered by
//! the upgrade extractor with a `4xx` and logged.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, FromRequestParts, Request, State};
use axum::http::header::{CONNECTION, CONTENT_TYPE, HOST, UPGRADE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use futures_util::StreamExt;
use tracing::{error, info, warn};

use crate::application::{
    DiagnosticReport, DiagnosticReporter, RequestSnapshot, DEMO_PAGE_CONTENT_TYPE, DEMO_PAGE_HTML,
};
use crate::domain::{ConnectionInfo, RequestKind};
use crate::infrastructure::ws_session;

/// Largest request body echoed back at the end of a diagnostic report.
pub const MAX_ECHOED_BODY: usize = 1024 * 1024;

/// State shared by both listeners.  Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub reporter: Arc<dyn DiagnosticReporter>,
}

impl AppState {
    pub fn new(reporter: Arc<dyn DiagnosticReporter>) -> Self {
        Self { reporter }
    }
}

/// Builds the router both listeners serve.  Every method and path lands in
/// [`dispatch`].
pub fn build_router(state: AppState) -> Router {
    Router::new().fallback(dispatch).with_state(state)
}

/// Logs, classifies and routes one request.
pub async fn dispatch(
    State(state): State<AppState>,
    ConnectInfo(connection): ConnectInfo<ConnectionInfo>,
    request: Request,
) -> Response {
    let peer = connection.remote_addr;
    info!("{peer} | {} {}", request.method(), request.uri());

    let kind = classify(&request);
    match kind {
        RequestKind::WebSocketUpgrade => upgrade(request, peer).await,
        RequestKind::DemoPage => demo_page(),
        RequestKind::Diagnostic => report(state, connection, request).await,
    }
}

fn classify(request: &Request) -> RequestKind {
    let headers = request.headers();
    RequestKind::classify(
        request.uri().path(),
        header_values(headers, &CONNECTION),
        header_values(headers, &UPGRADE),
    )
}

fn header_values<'a>(
    headers: &'a HeaderMap,
    name: &HeaderName,
) -> impl Iterator<Item = &'a str> + 'a {
    headers
        .get_all(name)
        .iter()
        .filter_map(|value| value.to_str().ok())
}

/// Completes the WebSocket handshake and hands the socket to a session task.
///
/// Origins are not checked: any page may open an echo session.
async fn upgrade(request: Request, peer: SocketAddr) -> Response {
    let (mut parts, _body) = request.into_parts();

    let upgrade = match WebSocketUpgrade::from_request_parts(&mut parts, &()).await {
        Ok(upgrade) => upgrade,
        Err(rejection) => {
            warn!("{peer} | websocket handshake rejected: {rejection}");
            return rejection.into_response();
        }
    };

    upgrade
        .on_failed_upgrade(move |e| warn!("{peer} | websocket upgrade failed: {e}"))
        .on_upgrade(move |socket| ws_session::handle_session(socket, peer))
}

fn demo_page() -> Response {
    let mut response = Response::new(Body::from(DEMO_PAGE_HTML));
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static(DEMO_PAGE_CONTENT_TYPE),
    );
    response
}

async fn report(state: AppState, connection: ConnectionInfo, request: Request) -> Response {
    let peer = connection.remote_addr;
    let (parts, body) = request.into_parts();

    let body = read_echoed_body(body, peer).await;

    let snapshot = RequestSnapshot {
        method: parts.method.to_string(),
        uri: parts.uri.to_string(),
        version: format!("{:?}", parts.version),
        host: parts
            .headers
            .get(HOST)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned()),
        headers: parts
            .headers
            .iter()
            .filter(|(name, _)| **name != HOST)
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
        connection,
        body,
    };

    // Host facts come from blocking file reads.
    let reporter = Arc::clone(&state.reporter);
    match tokio::task::spawn_blocking(move || reporter.report(&snapshot)).await {
        Ok(report) => report_response(report, peer),
        Err(e) => {
            error!("{peer} | diagnostic reporter failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Reads the whole request body and keeps its first [`MAX_ECHOED_BODY`]
/// bytes.  The rest is drained so the client can finish sending.
async fn read_echoed_body(body: Body, peer: SocketAddr) -> Vec<u8> {
    let mut chunks = body.into_data_stream();
    let mut echoed = Vec::new();
    let mut total = 0usize;

    while let Some(chunk) = chunks.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!("{peer} | request body read failed after {total} bytes: {e}");
                break;
            }
        };
        total += chunk.len();
        let room = MAX_ECHOED_BODY - echoed.len();
        echoed.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }

    if total > echoed.len() {
        warn!(
            "{peer} | request body truncated to {} of {total} bytes",
            echoed.len()
        );
    }
    echoed
}

fn report_response(report: DiagnosticReport, peer: SocketAddr) -> Response {
    let mut response = Response::new(Body::from(report.body));
    let headers = response.headers_mut();
    for (name, value) in report.headers {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => warn!("{peer} | skipping invalid response header {name:?}"),
        }
    }
    response
}

// ── Tests ─────────────────────────────────────────────────────────────────────
