//! Client error types.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use toolwire_protocol::{CodecError, JsonRpcError};
use toolwire_transport_traits::TransportError;

/// Result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by [`ToolClient`](crate::ToolClient) operations and
/// carried inside [`ClientEvent::Error`](crate::ClientEvent::Error).
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ClientError {
    /// No open connection and none is expected.
    #[error("Not connected")]
    NotConnected,

    /// The connection did not become ready within the readiness bound.
    #[error("Connection not ready after {waited:?}")]
    ReconnectTimeout {
        /// How long the caller waited
        waited: Duration,
    },

    /// No response arrived before the request deadline.
    #[error("Request timed out: {method} (after {timeout:?})")]
    Timeout {
        /// Method of the timed out request
        method: String,
        /// Deadline that elapsed
        timeout: Duration,
    },

    /// The peer answered with a JSON-RPC error object.
    #[error("{message} (code={code})")]
    Remote {
        /// Error code reported by the peer
        code: i32,
        /// Error message reported by the peer
        message: String,
        /// Optional structured error data
        data: Option<Value>,
    },

    /// A message could not be encoded or an inbound message was rejected.
    #[error("Protocol error: {0}")]
    Protocol(#[from] CodecError),

    /// The underlying transport failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The result did not match the type the caller asked for.
    #[error("Invalid result: {0}")]
    InvalidResult(String),

    /// The client configuration was rejected.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<JsonRpcError> for ClientError {
    fn from(error: JsonRpcError) -> Self {
        Self::Remote {
            code: error.code,
            message: error.message,
            data: error.data,
        }
    }
}

impl ClientError {
    /// The peer's error code, if this is a remote error
    pub fn remote_code(&self) -> Option<i32> {
        match self {
            Self::Remote { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the failure is about connectivity rather than the request itself
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::NotConnected | Self::ReconnectTimeout { .. } | Self::Transport(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_remote_error_message_format() {
        let err = ClientError::from(JsonRpcError::with_data(-32001, "Tool failed", json!({"x": 1})));
        assert_eq!(err.to_string(), "Tool failed (code=-32001)");
        assert_eq!(err.remote_code(), Some(-32001));
    }

    #[test]
    fn test_timeout_message_names_method() {
        let err = ClientError::Timeout {
            method: "tools/call".to_string(),
            timeout: Duration::from_millis(50),
        };
        assert!(err.to_string().contains("tools/call"));
        assert!(!err.is_connection_error());
    }

    #[test]
    fn test_connection_error_classification() {
        assert!(ClientError::NotConnected.is_connection_error());
        assert!(
            ClientError::Transport(TransportError::SendFailed("closed".into())).is_connection_error()
        );
        assert!(!ClientError::InvalidResult("x".into()).is_connection_error());
    }
}
