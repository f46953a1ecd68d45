//! Core transport types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of the client's single connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No connection exists.
    #[default]
    Disconnected,
    /// A handshake is in progress.
    Connecting,
    /// The connection is open and ready to carry frames.
    Connected,
    /// A requested close is in progress.
    Disconnecting,
}

impl ConnectionState {
    /// Whether frames can be sent right now
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Disconnecting => write!(f, "disconnecting"),
        }
    }
}
