//! Frames exchanged over a transport session.

use serde::{Deserialize, Serialize};

/// Close status codes (RFC 6455 numbering).
pub mod close_code {
    /// Normal, requested closure.
    pub const NORMAL: u16 = 1000;
    /// Close frame carried no status code.
    pub const NO_STATUS: u16 = 1005;
    /// Connection dropped without a close frame.
    pub const ABNORMAL: u16 = 1006;
}

/// Close code and reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseFrame {
    /// Close status code
    pub code: u16,
    /// Close reason, possibly empty
    pub reason: String,
}

impl CloseFrame {
    /// Create a close frame
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// A normal (1000) closure
    pub fn normal(reason: impl Into<String>) -> Self {
        Self::new(close_code::NORMAL, reason)
    }

    /// A connection that ended without a close frame (1006)
    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self::new(close_code::ABNORMAL, reason)
    }
}

/// Frame written by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// UTF-8 text payload
    Text(String),
    /// Start the closing handshake
    Close(CloseFrame),
}

/// Frame read from the peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// UTF-8 text payload
    Text(String),
    /// Peer started or confirmed the closing handshake
    Close(Option<CloseFrame>),
}
