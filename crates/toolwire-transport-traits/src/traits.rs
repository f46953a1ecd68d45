//! Core transport traits.

use std::collections::BTreeMap;
use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use futures::{Sink, Stream};
use serde::{Deserialize, Serialize};

use crate::error::{TransportError, TransportResult};
use crate::frame::{InboundFrame, OutboundFrame};

/// Write half of a session.
pub type FrameSink = Pin<Box<dyn Sink<OutboundFrame, Error = TransportError> + Send>>;

/// Read half of a session. Ends (`None`) when the underlying channel is gone.
pub type FrameStream = Pin<Box<dyn Stream<Item = TransportResult<InboundFrame>> + Send>>;

/// Where and how to connect.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Endpoint {
    /// Target address, e.g. `ws://127.0.0.1:7070`
    pub url: String,
    /// Extra handshake headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Endpoint {
    /// Endpoint without extra headers
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
        }
    }

    /// Add a handshake header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// One established duplex channel.
pub struct TransportSession {
    /// Outbound frames
    pub sink: FrameSink,
    /// Inbound frames, in arrival order
    pub stream: FrameStream,
}

impl TransportSession {
    /// Pair a sink and a stream
    pub fn new(sink: FrameSink, stream: FrameStream) -> Self {
        Self { sink, stream }
    }

    /// Split into halves
    pub fn into_parts(self) -> (FrameSink, FrameStream) {
        (self.sink, self.stream)
    }
}

impl fmt::Debug for TransportSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportSession")
            .field("sink", &"<FrameSink>")
            .field("stream", &"<FrameStream>")
            .finish()
    }
}

/// Opens transport sessions.
///
/// A connector is stateless from the client's point of view: every call to
/// [`connect`](Connector::connect) performs a fresh handshake and returns an
/// independent session.
#[async_trait]
pub trait Connector: Send + Sync + fmt::Debug {
    /// Perform the handshake against `endpoint`.
    async fn connect(&self, endpoint: &Endpoint) -> TransportResult<TransportSession>;
}
