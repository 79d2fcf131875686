//! WebSocket echo session: greeting, receive/echo loop and teardown.
//!
//! A session starts once the HTTP upgrade has completed (see
//! `dispatcher.rs`) and owns its socket exclusively.  It:
//!
//! 1. Sends one text frame identifying the server.
//! 2. Reads frames one at a time and writes each data frame straight back,
//!    text as text and binary as binary.  Frame N is echoed before frame N+1
//!    is read, so echo order is receive order.
//! 3. Ends on a close frame, end of stream, or the first read/write error.
//!
//! No error leaves the session: [`handle_session`] logs the outcome and the
//! socket is dropped on every exit path, which closes the connection.

use std::net::SocketAddr;
use std::pin::pin;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{describe_frame, greeting, FrameKind};
use crate::infrastructure::host::server_hostname;

/// Type-erased transport error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Why a session ended abnormally.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The greeting frame could not be sent; the echo loop never started.
    #[error("failed to send greeting: {0}")]
    Greeting(#[source] BoxError),

    #[error("read failed: {0}")]
    Receive(#[source] BoxError),

    #[error("echo failed: {0}")]
    Send(#[source] BoxError),
}

/// Entry point of each upgraded connection's task.
///
/// Wraps [`run_session`] and logs how it ended.  The socket is moved into the
/// session and released when it returns, whatever the outcome.
pub async fn handle_session(socket: WebSocket, peer: SocketAddr) {
    info!("{peer} | upgraded to websocket");

    let greeting_text = greeting(server_hostname().as_deref());
    let (outgoing, incoming) = socket.split();

    match run_session(incoming, outgoing, peer, greeting_text).await {
        Ok(()) => info!("{peer} | websocket closed"),
        Err(e) => warn!("{peer} | {e}"),
    }
}

/// Runs the greeting and the echo loop over any frame stream and sink.
///
/// Control frames are not echoed: pings are answered by the WebSocket layer
/// itself and pongs carry nothing to reflect.  A close frame completes the
/// closing handshake and ends the session.
///
/// # Errors
///
/// Returns the first failure; frames received before it have been echoed.
pub async fn run_session<St, Si, E>(
    incoming: St,
    outgoing: Si,
    peer: SocketAddr,
    greeting_text: String,
) -> Result<(), SessionError>
where
    St: Stream<Item = Result<Message, E>>,
    E: Into<BoxError>,
    Si: Sink<Message>,
    Si::Error: Into<BoxError>,
{
    let mut incoming = pin!(incoming);
    let mut outgoing = pin!(outgoing);

    outgoing
        .send(Message::Text(greeting_text.into()))
        .await
        .map_err(|e| SessionError::Greeting(e.into()))?;

    while let Some(frame) = incoming.next().await {
        let message = frame.map_err(|e| SessionError::Receive(e.into()))?;

        let (kind, payload) = match &message {
            Message::Text(text) => (FrameKind::Text, text.as_str().as_bytes()),
            Message::Binary(bytes) => (FrameKind::Binary, bytes.as_ref()),
            Message::Close(frame) => {
                debug!("{peer} | close frame received: {frame:?}");
                // The WebSocket layer queues the close reply; flushing writes it.
                if let Err(e) = outgoing.flush().await {
                    let e: BoxError = e.into();
                    debug!("{peer} | close reply not sent: {e}");
                }
                return Ok(());
            }
            Message::Ping(_) | Message::Pong(_) => continue,
        };
        info!("{peer} | {}", describe_frame(kind, payload));

        outgoing
            .send(message)
            .await
            .map_err(|e| SessionError::Send(e.into()))?;
    }

    debug!("{peer} | frame stream ended");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
