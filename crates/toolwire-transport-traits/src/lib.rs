//! # Toolwire Transport Traits
//!
//! The seam between the toolwire client and whatever carries its frames.
//! The client never opens sockets itself: it asks a [`Connector`] for a
//! [`TransportSession`], a message-oriented, ordered duplex channel made of a
//! [`FrameSink`] for outbound frames and a [`FrameStream`] for inbound ones.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use toolwire_transport_traits::{Connector, Endpoint, TransportResult, TransportSession};
//! use async_trait::async_trait;
//!
//! #[derive(Debug)]
//! struct MyConnector;
//!
//! #[async_trait]
//! impl Connector for MyConnector {
//!     async fn connect(&self, endpoint: &Endpoint) -> TransportResult<TransportSession> {
//!         // open the channel, wrap both halves
//!     }
//! }
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
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

mod error;
mod frame;
mod traits;
mod types;

pub use error::{TransportError, TransportResult};
pub use frame::{CloseFrame, InboundFrame, OutboundFrame, close_code};
pub use traits::{Connector, Endpoint, FrameSink, FrameStream, TransportSession};
pub use types::ConnectionState;
