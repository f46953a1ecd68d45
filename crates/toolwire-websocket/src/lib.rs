//! # Toolwire WebSocket
//!
//! [`Connector`](toolwire_transport_traits::Connector) implementation over
//! `tokio-tungstenite`. Each `connect` performs a fresh WebSocket handshake
//! (plain `ws://` or TLS `wss://`) and hands the client a text-frame session.
//!
//! Frame mapping:
//!
//! - text frames pass through unchanged
//! - binary frames holding valid UTF-8 are delivered as text, anything else
//!   surfaces as a receive error
//! - ping/pong are answered by tungstenite and never reach the client
//! - close frames carry their code and reason

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]

mod connector;

pub use connector::{DEFAULT_HANDSHAKE_TIMEOUT, WebSocketConnector};
