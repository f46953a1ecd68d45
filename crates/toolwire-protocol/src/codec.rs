//! Text codec for JSON-RPC frames.
//!
//! Outbound messages are serialized with `serde_json`. Inbound text is
//! classified strictly: it is a [`InboundMessage::Response`] only when it
//! carries the version marker, a string or integer `id`, and exactly one of
//! `result` / `error`; it is a [`InboundMessage::Notification`] only when it
//! carries the marker, a string `method`, and no `id`. Everything else is a
//! [`CodecError`].

use serde_json::{Map, Value};
use thiserror::Error;

use crate::jsonrpc::{
    JSONRPC_VERSION, JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    JsonRpcResponsePayload, JsonRpcVersion, RequestId,
};

/// Result alias for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors produced while encoding or classifying messages
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CodecError {
    /// Outbound message could not be serialized
    #[error("Failed to encode message: {0}")]
    Encode(String),

    /// Inbound text is not valid JSON
    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    /// Inbound JSON is not an object
    #[error("Expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// The `jsonrpc` marker is missing
    #[error("Missing jsonrpc version marker")]
    MissingVersion,

    /// The `jsonrpc` marker has the wrong value
    #[error("Unsupported jsonrpc version: {0}")]
    UnsupportedVersion(String),

    /// The `id` is neither a string nor an integer
    #[error("Invalid message id: {0}")]
    InvalidId(String),

    /// A response carried both `result` and `error`
    #[error("Response {0} carries both result and error")]
    AmbiguousResponse(RequestId),

    /// A message with an id carried neither `result` nor `error`
    #[error("Message {0} carries neither result nor error")]
    MissingOutcome(RequestId),

    /// A peer-initiated request (id plus method); the client does not serve requests
    #[error("Unsupported peer request '{method}' (id {id})")]
    UnsupportedRequest {
        /// Request identifier
        id: RequestId,
        /// Requested method
        method: String,
    },

    /// The `error` member is not a valid JSON-RPC error object
    #[error("Invalid error object in response {id}: {reason}")]
    InvalidErrorObject {
        /// Response identifier
        id: RequestId,
        /// Why the error object was rejected
        reason: String,
    },

    /// The `method` member is not a string
    #[error("Notification method must be a string")]
    InvalidMethod,

    /// No id and no method
    #[error("Message is neither a response nor a notification")]
    Unclassified,
}

/// A classified inbound message
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Answer to a request issued by this client
    Response(JsonRpcResponse),
    /// Peer-pushed notification
    Notification(JsonRpcNotification),
}

/// Stateless JSON-RPC text codec
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRpcCodec;

impl JsonRpcCodec {
    /// Create a codec
    pub const fn new() -> Self {
        Self
    }

    /// Encode a request to wire text
    pub fn encode_request(&self, request: &JsonRpcRequest) -> CodecResult<String> {
        serde_json::to_string(request).map_err(|e| CodecError::Encode(e.to_string()))
    }

    /// Encode a notification to wire text
    pub fn encode_notification(&self, notification: &JsonRpcNotification) -> CodecResult<String> {
        serde_json::to_string(notification).map_err(|e| CodecError::Encode(e.to_string()))
    }

    /// Classify inbound wire text
    pub fn decode(&self, text: &str) -> CodecResult<InboundMessage> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| CodecError::MalformedJson(e.to_string()))?;

        let mut object = match value {
            Value::Object(object) => object,
            other => return Err(CodecError::NotAnObject(json_type_name(&other))),
        };

        match object.get("jsonrpc") {
            Some(Value::String(version)) if version == JSONRPC_VERSION => {}
            Some(other) => return Err(CodecError::UnsupportedVersion(other.to_string())),
            None => return Err(CodecError::MissingVersion),
        }

        match object.remove("id") {
            Some(raw_id) => Self::decode_response(raw_id, object),
            None => Self::decode_notification(object),
        }
    }

    fn decode_response(raw_id: Value, mut object: Map<String, Value>) -> CodecResult<InboundMessage> {
        let id = RequestId::from_value(&raw_id)
            .ok_or_else(|| CodecError::InvalidId(raw_id.to_string()))?;

        let payload = match (object.remove("result"), object.remove("error")) {
            (Some(result), None) => JsonRpcResponsePayload::Success { result },
            (None, Some(error)) => {
                let error = serde_json::from_value::<JsonRpcError>(error).map_err(|e| {
                    CodecError::InvalidErrorObject {
                        id: id.clone(),
                        reason: e.to_string(),
                    }
                })?;
                JsonRpcResponsePayload::Error { error }
            }
            (Some(_), Some(_)) => return Err(CodecError::AmbiguousResponse(id)),
            (None, None) => {
                return Err(match object.remove("method") {
                    Some(Value::String(method)) => CodecError::UnsupportedRequest { id, method },
                    _ => CodecError::MissingOutcome(id),
                });
            }
        };

        Ok(InboundMessage::Response(JsonRpcResponse {
            jsonrpc: JsonRpcVersion,
            id,
            payload,
        }))
    }

    fn decode_notification(mut object: Map<String, Value>) -> CodecResult<InboundMessage> {
        match object.remove("method") {
            Some(Value::String(method)) => {
                Ok(InboundMessage::Notification(JsonRpcNotification {
                    jsonrpc: JsonRpcVersion,
                    method,
                    params: object.remove("params"),
                }))
            }
            Some(_) => Err(CodecError::InvalidMethod),
            None => Err(CodecError::Unclassified),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
