//! Client lifecycle and notification events.

use tokio::sync::broadcast;
use toolwire_protocol::JsonRpcNotification;

use crate::error::ClientError;

/// Something observable happened on the client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// A connection was opened (first connect or reconnect).
    Open,

    /// The connection closed without being asked to.
    Closed {
        /// Close status code
        code: u16,
        /// Close reason, possibly empty
        reason: String,
    },

    /// A transport, handshake or decode failure.
    Error {
        /// What went wrong
        cause: ClientError,
    },

    /// The peer pushed a notification.
    Notification {
        /// The decoded notification
        notification: JsonRpcNotification,
    },
}

/// Broadcasts [`ClientEvent`]s to every current subscriber.
///
/// Emission never blocks. Subscribers that fall more than the channel
/// capacity behind observe `RecvError::Lagged` and skip ahead.
#[derive(Debug, Clone)]
pub(crate) struct EventBus {
    sender: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.sender.subscribe()
    }

    pub(crate) fn emit(&self, event: ClientEvent) {
        // No subscribers is fine.
        let _ = self.sender.send(event);
    }

    pub(crate) fn emit_error(&self, cause: ClientError) {
        self.emit(ClientEvent::Error { cause });
    }
}
