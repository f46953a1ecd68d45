//! Common imports for client code.
//!
//! ```rust
//! use toolwire_client::prelude::*;
//! ```

pub use crate::{
    ClientConfig, ClientError, ClientEvent, ClientResult, ConnectionState, ReconnectState,
    ToolClient, ToolInvocation, ToolRegistration,
};
pub use serde_json::{Value, json};
