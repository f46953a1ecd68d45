//! Test infrastructure: a real WebSocket JSON-RPC peer.
//!
//! NO MOCKS: the peer is a tokio-tungstenite server on an ephemeral port.

#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{WebSocketStream, accept_async};
use toolwire_client::{ClientConfig, ClientEvent};

pub type Ws = WebSocketStream<TcpStream>;

pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// WebSocket server running a handler per accepted connection.
pub struct TestPeer {
    url: String,
    connections: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl TestPeer {
    /// Accept any number of connections.
    pub async fn start<F, Fut>(handler: F) -> Self
    where
        F: Fn(Ws, usize) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::start_limited(usize::MAX, handler).await
    }

    /// Accept `limit` connections, then stop listening so later connects are refused.
    pub async fn start_limited<F, Fut>(limit: usize, handler: F) -> Self
    where
        F: Fn(Ws, usize) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let connections = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&connections);
        let handler = Arc::new(handler);

        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let index = counter.fetch_add(1, Ordering::SeqCst);
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    if let Ok(ws) = accept_async(stream).await {
                        handler(ws, index).await;
                    }
                });
                if index + 1 >= limit {
                    break;
                }
            }
        });

        Self {
            url,
            connections,
            task,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.url.clone())
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

impl Drop for TestPeer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Serve the test method table until the client goes away.
///
/// Returns the close code the client sent, if any.
pub async fn serve_rpc(mut ws: Ws) -> Option<u16> {
    let mut close_code = None;
    while let Some(Ok(msg)) = ws.next().await {
        let text = match msg {
            Message::Text(text) => text.to_string(),
            Message::Close(frame) => {
                close_code = frame.map(|f| u16::from(f.code));
                continue;
            }
            _ => continue,
        };
        let message: Value = serde_json::from_str(&text).unwrap();
        for action in respond(&message) {
            match action {
                Action::Send(reply) => {
                    if ws.send(Message::Text(reply.into())).await.is_err() {
                        return close_code;
                    }
                }
                Action::Sleep(delay) => tokio::time::sleep(delay).await,
                Action::Close(code, reason) => {
                    close(&mut ws, code, reason).await;
                    return close_code;
                }
            }
        }
    }
    close_code
}

/// Close from the server side and drain until the client confirms.
pub async fn close(ws: &mut Ws, code: u16, reason: &str) {
    let _ = ws
        .close(Some(CloseFrame {
            code: code.into(),
            reason: reason.into(),
        }))
        .await;
    while ws.next().await.is_some() {}
}

enum Action {
    Send(String),
    Sleep(Duration),
    Close(u16, &'static str),
}

fn result(id: &Value, result: Value) -> Action {
    Action::Send(json!({"jsonrpc": "2.0", "id": id, "result": result}).to_string())
}

fn error(id: &Value, code: i32, message: &str, data: Option<Value>) -> Action {
    let mut error = json!({"code": code, "message": message});
    if let Some(data) = data {
        error["data"] = data;
    }
    Action::Send(json!({"jsonrpc": "2.0", "id": id, "error": error}).to_string())
}

fn notification(method: &str, params: Value) -> Action {
    Action::Send(json!({"jsonrpc": "2.0", "method": method, "params": params}).to_string())
}

fn respond(message: &Value) -> Vec<Action> {
    let method = message["method"].as_str().unwrap_or_default();
    let params = message.get("params").cloned().unwrap_or(Value::Null);

    let Some(id) = message.get("id") else {
        return match method {
            "tools/register" => vec![notification("tools/registered", params)],
            "stream" => (1..=3)
                .map(|seq| notification("progress", json!({"seq": seq})))
                .collect(),
            "garbage" => vec![
                Action::Send("not json".to_string()),
                Action::Send(r#"{"jsonrpc":"2.0","id":1}"#.to_string()),
                notification("after", json!({})),
            ],
            _ => Vec::new(),
        };
    };

    match method {
        "echo" => vec![result(id, params)],
        "whoami" => vec![result(id, json!({"id": id, "params": params}))],
        "fail" => vec![error(id, -32001, "Tool failed", Some(json!({"reason": "boom"})))],
        "slow" => vec![Action::Sleep(Duration::from_millis(300)), result(id, json!("late"))],
        "never" => Vec::new(),
        "tools/call" => vec![result(
            id,
            json!({"tool": params["name"], "arguments": params["arguments"]}),
        )],
        "bye" => vec![Action::Close(1000, "done")],
        "drop_me" => vec![Action::Close(1011, "Internal error")],
        other => vec![error(id, -32601, &format!("Method not found: {other}"), None)],
    }
}

/// Next event, failing the test if none arrives in time.
pub async fn next_event(events: &mut broadcast::Receiver<ClientEvent>) -> ClientEvent {
    tokio::time::timeout(EVENT_TIMEOUT, events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Poll `condition` until it holds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(EVENT_TIMEOUT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
