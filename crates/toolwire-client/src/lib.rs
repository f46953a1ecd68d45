//! # Toolwire Client
//!
//! Bidirectional JSON-RPC 2.0 client for remote tool servers. One persistent
//! connection carries requests, responses and server-pushed notifications.
//!
//! ## Features
//!
//! - **Correlation** - concurrent calls, each with its own id and deadline
//! - **Readiness** - calls issued while (re)connecting wait for the link
//! - **Reconnection** - bounded retries at a fixed interval after unexpected closes
//! - **Events** - `Open`, `Closed`, `Error` and `Notification` over a broadcast channel
//!
//! ## Example
//!
//! ```rust,no_run
//! use serde_json::json;
//! use toolwire_client::{ClientConfig, ToolClient};
//! use toolwire_protocol::ToolInvocation;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ToolClient::websocket(ClientConfig::new("ws://127.0.0.1:7070"))?;
//! client.connect().await?;
//!
//! let result = client
//!     .invoke_tool(&ToolInvocation::new("read_file").with_arguments(json!({"path": "README.md"})))
//!     .await?;
//! println!("{result}");
//!
//! client.disconnect().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Transports
//!
//! The client never touches sockets directly. It is built over a
//! [`Connector`](toolwire_transport_traits::Connector); the `websocket`
//! feature (on by default) provides [`ToolClient::websocket`].

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod prelude;

pub use client::{ReconnectPolicy, ReconnectState, ToolClient};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use events::ClientEvent;

pub use toolwire_protocol::{JsonRpcNotification, RequestId, ToolInvocation, ToolRegistration};
pub use toolwire_transport_traits::{ConnectionState, Connector, Endpoint, TransportError};
