//! Integration tests for the WebSocket connector against a real server.
//!
//! NO MOCKS: every test binds a tokio-tungstenite server on an ephemeral port.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::CloseFrame as WsCloseFrame;
use tokio_tungstenite::{accept_async, accept_hdr_async};
use toolwire_transport_traits::{
    CloseFrame, Connector, Endpoint, InboundFrame, OutboundFrame, TransportError,
};
use toolwire_websocket::WebSocketConnector;

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    (listener, url)
}

#[tokio::test]
async fn test_text_frames_round_trip() {
    let (listener, url) = bind().await;
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Text(text) = msg {
                ws.send(Message::Text(format!("echo:{}", text).into()))
                    .await
                    .unwrap();
            }
        }
    });

    let session = WebSocketConnector::new()
        .connect(&Endpoint::new(url))
        .await
        .unwrap();
    let (mut sink, mut stream) = session.into_parts();

    sink.send(OutboundFrame::Text("ping".to_string())).await.unwrap();
    let frame = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .unwrap();
    assert_eq!(frame, Some(Ok(InboundFrame::Text("echo:ping".to_string()))));
}

#[tokio::test]
async fn test_handshake_headers_are_sent() {
    let (listener, url) = bind().await;
    let (header_tx, header_rx) = oneshot::channel::<Option<String>>();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            let token = req
                .headers()
                .get("x-api-key")
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            let _ = header_tx.send(token);
            Ok(resp)
        };
        let mut ws = accept_hdr_async(stream, callback).await.unwrap();
        while ws.next().await.is_some() {}
    });

    let endpoint = Endpoint::new(url).with_header("X-Api-Key", "secret");
    let _session = WebSocketConnector::new().connect(&endpoint).await.unwrap();

    assert_eq!(header_rx.await.unwrap(), Some("secret".to_string()));
}

#[tokio::test]
async fn test_binary_utf8_delivered_as_text() {
    let (listener, url) = bind().await;
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::Binary(br#"{"jsonrpc":"2.0","method":"hi"}"#.to_vec().into()))
            .await
            .unwrap();
        while ws.next().await.is_some() {}
    });

    let session = WebSocketConnector::new()
        .connect(&Endpoint::new(url))
        .await
        .unwrap();
    let (_sink, mut stream) = session.into_parts();

    let frame = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .unwrap();
    assert_eq!(
        frame,
        Some(Ok(InboundFrame::Text(
            r#"{"jsonrpc":"2.0","method":"hi"}"#.to_string()
        )))
    );
}

#[tokio::test]
async fn test_server_close_reports_code_and_reason() {
    let (listener, url) = bind().await;
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.close(Some(WsCloseFrame {
            code: 1012.into(),
            reason: "Restarting".into(),
        }))
        .await
        .unwrap();
        while ws.next().await.is_some() {}
    });

    let session = WebSocketConnector::new()
        .connect(&Endpoint::new(url))
        .await
        .unwrap();
    let (mut sink, mut stream) = session.into_parts();

    let frame = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .unwrap();
    assert_eq!(
        frame,
        Some(Ok(InboundFrame::Close(Some(CloseFrame::new(
            1012,
            "Restarting"
        )))))
    );

    let err = sink
        .send(OutboundFrame::Text("late".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::ConnectionLost(_)));
}

#[tokio::test]
async fn test_client_close_is_seen_by_server() {
    let (listener, url) = bind().await;
    let (close_tx, close_rx) = oneshot::channel::<Option<u16>>();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Close(frame) = msg {
                let _ = close_tx.send(frame.map(|f| u16::from(f.code)));
                break;
            }
        }
    });

    let session = WebSocketConnector::new()
        .connect(&Endpoint::new(url))
        .await
        .unwrap();
    let (mut sink, _stream) = session.into_parts();
    sink.send(OutboundFrame::Close(CloseFrame::normal("done")))
        .await
        .unwrap();

    let code = tokio::time::timeout(Duration::from_secs(5), close_rx)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(code, Some(1000));
}

#[tokio::test]
async fn test_refused_connection_fails() {
    // Bind then drop to get a port nobody listens on.
    let (listener, url) = bind().await;
    drop(listener);

    let err = WebSocketConnector::new()
        .connect(&Endpoint::new(url))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::ConnectionFailed(_)));
}

#[tokio::test]
async fn test_handshake_timeout() {
    // Accepts TCP but never answers the upgrade.
    let (listener, url) = bind().await;
    tokio::spawn(async move {
        let (_stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let err = WebSocketConnector::new()
        .with_handshake_timeout(Duration::from_millis(100))
        .connect(&Endpoint::new(url))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::ConnectionFailed(ref msg) if msg.contains("timed out")));
}
