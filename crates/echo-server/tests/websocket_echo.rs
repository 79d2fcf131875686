//! End-to-end tests for WebSocket echo sessions over the plain listener.

mod common;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(url: String) -> Client {
    let (ws, response) = timeout(Duration::from_secs(5), connect_async(url))
        .await
        .expect("handshake within timeout")
        .expect("handshake succeeds");
    assert_eq!(response.status(), 101);
    ws
}

async fn next_frame(ws: &mut Client) -> Message {
    timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("frame within timeout")
        .expect("stream still open")
        .expect("frame is valid")
}

async fn expect_greeting(ws: &mut Client) {
    match next_frame(ws).await {
        Message::Text(text) => assert!(
            text.starts_with("Request served by ") || text.starts_with("Server hostname unknown: "),
            "unexpected greeting: {text}"
        ),
        other => panic!("expected a text greeting, got {other:?}"),
    }
}

#[tokio::test]
async fn test_greeting_arrives_before_any_echo() {
    let server = common::start(common::loopback_config(Vec::new())).await;
    let mut ws = connect(format!("ws://{}/ws", server.plain)).await;

    expect_greeting(&mut ws).await;

    ws.send(Message::Text("hello".into())).await.unwrap();
    assert_eq!(next_frame(&mut ws).await, Message::Text("hello".into()));
}

#[tokio::test]
async fn test_frames_echoed_in_receive_order() {
    let server = common::start(common::loopback_config(Vec::new())).await;
    let mut ws = connect(format!("ws://{}/ws", server.plain)).await;
    expect_greeting(&mut ws).await;

    for i in 0..20 {
        ws.send(Message::Text(format!("frame-{i}"))).await.unwrap();
    }
    for i in 0..20 {
        assert_eq!(next_frame(&mut ws).await, Message::Text(format!("frame-{i}")));
    }
}

#[tokio::test]
async fn test_binary_frame_echoed_byte_for_byte() {
    let server = common::start(common::loopback_config(Vec::new())).await;
    let mut ws = connect(format!("ws://{}/ws", server.plain)).await;
    expect_greeting(&mut ws).await;

    let payload: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();
    ws.send(Message::Binary(payload.clone())).await.unwrap();

    assert_eq!(next_frame(&mut ws).await, Message::Binary(payload));
}

#[tokio::test]
async fn test_text_and_binary_kinds_are_preserved() {
    let server = common::start(common::loopback_config(Vec::new())).await;
    let mut ws = connect(format!("ws://{}/ws", server.plain)).await;
    expect_greeting(&mut ws).await;

    ws.send(Message::Binary(b"abc".to_vec())).await.unwrap();
    ws.send(Message::Text("abc".into())).await.unwrap();

    assert_eq!(next_frame(&mut ws).await, Message::Binary(b"abc".to_vec()));
    assert_eq!(next_frame(&mut ws).await, Message::Text("abc".into()));
}

#[tokio::test]
async fn test_upgrade_accepted_on_any_path() {
    let server = common::start(common::loopback_config(Vec::new())).await;
    let mut ws = connect(format!("ws://{}/some/other/path?q=1", server.plain)).await;

    expect_greeting(&mut ws).await;
    ws.send(Message::Text("anywhere".into())).await.unwrap();
    assert_eq!(next_frame(&mut ws).await, Message::Text("anywhere".into()));
}

#[tokio::test]
async fn test_closing_one_session_leaves_others_running() {
    let server = common::start(common::loopback_config(Vec::new())).await;
    let mut first = connect(format!("ws://{}/ws", server.plain)).await;
    let mut second = connect(format!("ws://{}/", server.plain)).await;
    expect_greeting(&mut first).await;
    expect_greeting(&mut second).await;

    first.close(None).await.unwrap();
    assert!(matches!(next_frame(&mut first).await, Message::Close(_)));

    second.send(Message::Text("still here".into())).await.unwrap();
    assert_eq!(
        next_frame(&mut second).await,
        Message::Text("still here".into())
    );
}

#[tokio::test]
async fn test_client_close_is_answered_with_close_frame() {
    let server = common::start(common::loopback_config(Vec::new())).await;
    let mut ws = connect(format!("ws://{}/ws", server.plain)).await;
    expect_greeting(&mut ws).await;

    ws.send(Message::Text("last".into())).await.unwrap();
    assert_eq!(next_frame(&mut ws).await, Message::Text("last".into()));

    ws.send(Message::Close(None)).await.unwrap();
    let reply = timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("close reply within timeout");
    assert!(
        matches!(reply, Some(Ok(Message::Close(_)))),
        "expected a close frame, got {reply:?}"
    );

    // The handshake is complete; the stream ends without a reset.
    let end = timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("stream ends within timeout");
    assert!(end.is_none(), "expected end of stream, got {end:?}");
}

#[tokio::test]
async fn test_abrupt_disconnect_does_not_stop_server() {
    let server = common::start(common::loopback_config(Vec::new())).await;

    let mut dropped = connect(format!("ws://{}/ws", server.plain)).await;
    expect_greeting(&mut dropped).await;
    drop(dropped);

    let mut ws = connect(format!("ws://{}/ws", server.plain)).await;
    expect_greeting(&mut ws).await;
    ws.send(Message::Text("after drop".into())).await.unwrap();
    assert_eq!(next_frame(&mut ws).await, Message::Text("after drop".into()));
}
