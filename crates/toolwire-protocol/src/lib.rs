//! # Toolwire Protocol
//!
//! Wire-level building blocks for the toolwire client: JSON-RPC 2.0 message
//! types, request identifiers, the text codec that classifies inbound frames,
//! and the payload shapes used for tool registration and invocation.
//!
//! ## Wire format
//!
//! One JSON object per transport frame:
//!
//! ```text
//! Request       {"jsonrpc":"2.0","id":<string|number>,"method":<string>,"params":<any>}
//! Response (ok) {"jsonrpc":"2.0","id":<same id>,"result":<any>}
//! Response (err){"jsonrpc":"2.0","id":<same id>,"error":{"code":<int>,"message":<string>,"data":<any>}}
//! Notification  {"jsonrpc":"2.0","method":<string>,"params":<any>}
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use toolwire_protocol::{InboundMessage, JsonRpcCodec, JsonRpcRequest, RequestId};
//!
//! let codec = JsonRpcCodec::new();
//! let request = JsonRpcRequest::new("ping", None, RequestId::Number(1));
//! let text = codec.encode_request(&request)?;
//! assert!(text.contains("\"method\":\"ping\""));
//!
//! let inbound = codec.decode(r#"{"jsonrpc":"2.0","id":1,"result":{"ok":true}}"#)?;
//! assert!(matches!(inbound, InboundMessage::Response(_)));
//! # Ok::<(), toolwire_protocol::CodecError>(())
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

pub mod codec;
pub mod jsonrpc;
pub mod tools;

pub use codec::{CodecError, CodecResult, InboundMessage, JsonRpcCodec};
pub use jsonrpc::{
    JSONRPC_VERSION, JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    JsonRpcResponsePayload, JsonRpcVersion, RequestId,
};
pub use tools::{CALL_TOOL_METHOD, REGISTER_TOOL_METHOD, ToolInvocation, ToolRegistration};
