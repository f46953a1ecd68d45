//! The [`ToolClient`] facade.

mod connection;
mod correlator;
mod reconnect;

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;
use toolwire_protocol::{
    CALL_TOOL_METHOD, JsonRpcNotification, JsonRpcRequest, REGISTER_TOOL_METHOD, ToolInvocation,
    ToolRegistration,
};
use toolwire_transport_traits::{ConnectionState, Connector};
use tracing::{debug, trace};

use self::connection::{ConnectionManager, SendFailure};
pub use self::reconnect::{ReconnectPolicy, ReconnectState};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::events::ClientEvent;

/// JSON-RPC tool client over one persistent connection.
///
/// Cloning is cheap and every clone drives the same connection. Calls may be
/// issued concurrently from any number of tasks; each one is matched to its
/// response by id and timed out on its own.
///
/// When the last clone is dropped the connection and any scheduled
/// reconnection are torn down.
#[derive(Debug, Clone)]
pub struct ToolClient {
    manager: Arc<ConnectionManager>,
}

impl ToolClient {
    /// Build a client that opens sessions through `connector`.
    ///
    /// The configuration is validated here; nothing is connected until
    /// [`connect`](Self::connect).
    pub fn new<C>(config: ClientConfig, connector: C) -> ClientResult<Self>
    where
        C: Connector + 'static,
    {
        Self::with_connector(config, Arc::new(connector))
    }

    /// Build a client around a shared connector.
    pub fn with_connector(config: ClientConfig, connector: Arc<dyn Connector>) -> ClientResult<Self> {
        config.validate()?;
        Ok(Self {
            manager: Arc::new(ConnectionManager::new(config, connector)),
        })
    }

    /// Build a client that speaks WebSocket.
    #[cfg(feature = "websocket")]
    #[cfg_attr(docsrs, doc(cfg(feature = "websocket")))]
    pub fn websocket(config: ClientConfig) -> ClientResult<Self> {
        Self::new(config, toolwire_websocket::WebSocketConnector::new())
    }

    /// Open the connection. Does nothing if it is already open.
    ///
    /// Also clears an exhausted reconnection policy.
    pub async fn connect(&self) -> ClientResult<()> {
        self.manager.connect().await
    }

    /// Close the connection with code 1000.
    ///
    /// No [`ClientEvent::Closed`] is emitted and no reconnection follows.
    /// Outstanding calls fail with [`ClientError::NotConnected`].
    pub async fn disconnect(&self) -> ClientResult<()> {
        self.manager.disconnect().await
    }

    /// Call `method` with the configured request timeout.
    pub async fn call(&self, method: &str, params: Option<Value>) -> ClientResult<Value> {
        self.call_with_timeout(method, params, self.manager.config().request_timeout())
            .await
    }

    /// Call `method` and wait at most `timeout` for its response.
    ///
    /// The readiness wait before sending is bounded separately, see
    /// [`ClientConfig::ready_bound`]. A request whose connection goes away
    /// before it is answered is sent again, with the same id and deadline,
    /// once a new connection opens.
    pub async fn call_with_timeout(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
    ) -> ClientResult<Value> {
        let ready = self.manager.ready_bound(timeout);
        self.manager.wait_ready(ready).await?;

        let correlator = self.manager.correlator();
        let id = correlator.next_id();
        let text = self
            .manager
            .codec()
            .encode_request(&JsonRpcRequest::new(method, params, id.clone()))?;

        // Register before sending so the response always finds its entry.
        let mut response = correlator.register(id.clone(), method, timeout);
        loop {
            trace!(%id, method, "sending request");
            let generation = match self.manager.send_text(text.clone()).await {
                Ok(generation) => Some(generation),
                Err(SendFailure::Retired(generation)) => generation,
                Err(SendFailure::Failed(error)) => {
                    correlator.discard(&id);
                    return Err(error);
                }
            };

            tokio::select! {
                biased;
                outcome = &mut response => return outcome.unwrap_or(Err(ClientError::NotConnected)),
                () = self.manager.wait_retired(generation) => {}
            }
            debug!(%id, method, "connection retired before the response, resending");

            tokio::select! {
                biased;
                outcome = &mut response => return outcome.unwrap_or(Err(ClientError::NotConnected)),
                opened = self.manager.wait_ready(ready) => {
                    if let Err(error) = opened {
                        correlator.discard(&id);
                        return Err(error);
                    }
                }
            }
        }
    }

    /// Call `method` and deserialize the result into `T`.
    pub async fn call_as<T>(&self, method: &str, params: Option<Value>) -> ClientResult<T>
    where
        T: DeserializeOwned,
    {
        let result = self.call(method, params).await?;
        decode_result(method, result)
    }

    /// Send a notification; returns once it is written.
    pub async fn notify(&self, method: &str, params: Option<Value>) -> ClientResult<()> {
        let ready = self
            .manager
            .ready_bound(self.manager.config().ready_timeout());
        self.manager.wait_ready(ready).await?;
        let text = self
            .manager
            .codec()
            .encode_notification(&JsonRpcNotification::new(method, params))?;
        loop {
            trace!(method, "sending notification");
            match self.manager.send_text(text.clone()).await {
                Ok(_) => return Ok(()),
                Err(SendFailure::Retired(generation)) => {
                    debug!(method, "connection retired before the notification was written");
                    self.manager.wait_retired(generation).await;
                    self.manager.wait_ready(ready).await?;
                }
                Err(SendFailure::Failed(error)) => return Err(error),
            }
        }
    }

    /// Advertise a tool to the peer (`tools/register` notification).
    pub async fn register_tool(&self, tool: &ToolRegistration) -> ClientResult<()> {
        self.notify(REGISTER_TOOL_METHOD, Some(tool.to_params())).await
    }

    /// Invoke a remote tool (`tools/call` request).
    pub async fn invoke_tool(&self, invocation: &ToolInvocation) -> ClientResult<Value> {
        self.call(CALL_TOOL_METHOD, Some(invocation.to_params()))
            .await
    }

    /// Invoke a remote tool and deserialize its result into `T`.
    pub async fn invoke_tool_as<T>(&self, invocation: &ToolInvocation) -> ClientResult<T>
    where
        T: DeserializeOwned,
    {
        let result = self.invoke_tool(invocation).await?;
        decode_result(CALL_TOOL_METHOD, result)
    }

    /// Receive lifecycle events and server notifications from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.manager.events().subscribe()
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.manager.state()
    }

    /// Current reconnection policy state
    pub fn reconnect_state(&self) -> ReconnectState {
        self.manager.reconnect_state()
    }

    /// Number of calls waiting for a response
    pub fn pending_requests(&self) -> usize {
        self.manager.correlator().pending_count()
    }

    /// Configuration this client was built with
    pub fn config(&self) -> &ClientConfig {
        self.manager.config()
    }
}

fn decode_result<T: DeserializeOwned>(method: &str, result: Value) -> ClientResult<T> {
    serde_json::from_value(result)
        .map_err(|e| ClientError::InvalidResult(format!("{} returned an unexpected shape: {}", method, e)))
}
