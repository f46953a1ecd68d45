//! WebSocket handshake and frame mapping.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt, future};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::protocol::CloseFrame as WsCloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, info};

use toolwire_transport_traits::{
    CloseFrame, Connector, Endpoint, FrameSink, FrameStream, InboundFrame, OutboundFrame,
    TransportError, TransportResult, TransportSession,
};

/// Upper bound on a single handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens WebSocket sessions.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    handshake_timeout: Duration,
}

impl Default for WebSocketConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSocketConnector {
    /// Connector with the default handshake timeout
    pub fn new() -> Self {
        Self {
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    /// Set the handshake timeout
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, endpoint: &Endpoint) -> TransportResult<TransportSession> {
        let mut request = endpoint.url.as_str().into_client_request().map_err(|e| {
            TransportError::ConfigurationError(format!("invalid url {}: {}", endpoint.url, e))
        })?;

        for (name, value) in &endpoint.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                TransportError::ConfigurationError(format!("invalid header name {}: {}", name, e))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                TransportError::ConfigurationError(format!("invalid header value for {}: {}", name, e))
            })?;
            request.headers_mut().insert(name, value);
        }

        debug!("Opening WebSocket connection to {}", endpoint.url);
        let (stream, _response) = tokio::time::timeout(self.handshake_timeout, connect_async(request))
            .await
            .map_err(|_| {
                TransportError::ConnectionFailed(format!(
                    "handshake with {} timed out after {:?}",
                    endpoint.url, self.handshake_timeout
                ))
            })?
            .map_err(|e| {
                TransportError::ConnectionFailed(format!("WebSocket connection failed: {}", e))
            })?;
        info!("WebSocket connected to {}", endpoint.url);

        let (writer, reader) = stream.split();

        let sink: FrameSink = Box::pin(
            writer
                .sink_map_err(send_error)
                .with(|frame: OutboundFrame| future::ready(Ok::<_, TransportError>(to_message(frame)))),
        );
        let stream: FrameStream = Box::pin(reader.filter_map(|msg| future::ready(from_message(msg))));

        Ok(TransportSession::new(sink, stream))
    }
}

fn to_message(frame: OutboundFrame) -> Message {
    match frame {
        OutboundFrame::Text(text) => Message::Text(text.into()),
        OutboundFrame::Close(close) => Message::Close(Some(WsCloseFrame {
            code: close.code.into(),
            reason: close.reason.into(),
        })),
    }
}

/// A write refused because the close handshake started is `ConnectionLost`:
/// nothing reached the wire.
fn send_error(error: WsError) -> TransportError {
    match error {
        WsError::ConnectionClosed
        | WsError::AlreadyClosed
        | WsError::Protocol(ProtocolError::SendAfterClosing) => {
            TransportError::ConnectionLost(error.to_string())
        }
        other => TransportError::SendFailed(other.to_string()),
    }
}

fn from_message(msg: Result<Message, WsError>) -> Option<TransportResult<InboundFrame>> {
    match msg {
        Ok(Message::Text(text)) => Some(Ok(InboundFrame::Text(text.as_str().to_owned()))),
        Ok(Message::Binary(data)) => Some(
            std::str::from_utf8(&data)
                .map(|text| InboundFrame::Text(text.to_owned()))
                .map_err(|e| TransportError::ReceiveFailed(format!("binary frame is not UTF-8: {}", e))),
        ),
        Ok(Message::Close(frame)) => Some(Ok(InboundFrame::Close(frame.map(|f| {
            CloseFrame::new(u16::from(f.code), f.reason.as_str())
        })))),
        Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => None,
        Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => None,
        Err(e) => Some(Err(TransportError::ReceiveFailed(e.to_string()))),
    }
}
