//! Client configuration.
//!
//! [`ClientConfig`] is fixed once the client is built. It deserializes with
//! defaults for every missing field, so a config file only needs `url`.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use toolwire_transport_traits::Endpoint;

use crate::error::{ClientError, ClientResult};

/// Configuration for a [`ToolClient`](crate::ToolClient)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Target address (`ws://` or `wss://`)
    pub url: String,

    /// Extra handshake headers
    pub headers: BTreeMap<String, String>,

    /// Reconnect automatically after an unexpected close
    pub reconnect: bool,

    /// Maximum reconnection attempts per outage
    pub reconnect_attempts: u32,

    /// Delay before each reconnection attempt in milliseconds
    pub reconnect_interval_ms: u64,

    /// Default request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Readiness bound for notifications in milliseconds
    pub ready_timeout_ms: u64,

    /// Slack added to the reconnection window when waiting for readiness
    pub ready_grace_ms: u64,

    /// How long `disconnect` waits for the peer to confirm the close
    pub close_timeout_ms: u64,

    /// Capacity of the event broadcast channel
    pub event_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            headers: BTreeMap::new(),
            reconnect: true,
            reconnect_attempts: 5,
            reconnect_interval_ms: 1_000,
            request_timeout_ms: 10_000,
            ready_timeout_ms: 5_000,
            ready_grace_ms: 500,
            close_timeout_ms: 5_000,
            event_capacity: 256,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl ClientConfig {
    /// Default configuration for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Add a handshake header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Enable or disable automatic reconnection
    pub fn with_reconnect(mut self, reconnect: bool) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Set the maximum number of reconnection attempts
    pub fn with_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.reconnect_attempts = attempts;
        self
    }

    /// Set the delay between reconnection attempts
    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval_ms = millis(interval);
        self
    }

    /// Set the default request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = millis(timeout);
        self
    }

    /// Set the readiness bound used by notifications
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout_ms = millis(timeout);
        self
    }

    /// Set the readiness grace period
    pub fn with_ready_grace(mut self, grace: Duration) -> Self {
        self.ready_grace_ms = millis(grace);
        self
    }

    /// Set the close confirmation timeout
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout_ms = millis(timeout);
        self
    }

    /// Set the event channel capacity
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Delay between reconnection attempts
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    /// Default request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Readiness bound for notifications
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    /// Close confirmation timeout
    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }

    /// How long a caller asking for `requested` may wait for the connection:
    /// the larger of `requested` and the full reconnection window plus grace.
    pub fn ready_bound(&self, requested: Duration) -> Duration {
        let window = u64::from(self.reconnect_attempts)
            .saturating_mul(self.reconnect_interval_ms)
            .saturating_add(self.ready_grace_ms);
        requested.max(Duration::from_millis(window))
    }

    /// Transport endpoint derived from the url and headers
    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            url: self.url.clone(),
            headers: self.headers.clone(),
        }
    }

    /// Check the configuration before a client is built
    pub fn validate(&self) -> ClientResult<()> {
        if self.url.is_empty() {
            return Err(ClientError::Configuration("url is required".to_string()));
        }
        let parsed = url::Url::parse(&self.url)
            .map_err(|e| ClientError::Configuration(format!("invalid url {}: {}", self.url, e)))?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(ClientError::Configuration(format!(
                "unsupported scheme {}, expected ws or wss",
                parsed.scheme()
            )));
        }
        if self.event_capacity == 0 {
            return Err(ClientError::Configuration(
                "event_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("ws://localhost:7070");
        assert!(config.reconnect);
        assert_eq!(config.reconnect_attempts, 5);
        assert_eq!(config.reconnect_interval(), Duration::from_secs(1));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.ready_timeout(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ready_bound_uses_reconnect_window() {
        let config = ClientConfig::new("ws://localhost:7070");
        // 5 attempts * 1000ms + 500ms grace
        assert_eq!(
            config.ready_bound(Duration::from_secs(1)),
            Duration::from_millis(5_500)
        );
        assert_eq!(
            config.ready_bound(Duration::from_secs(30)),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_builders() {
        let config = ClientConfig::new("wss://tools.example.com/rpc")
            .with_header("Authorization", "Bearer abc")
            .with_reconnect_attempts(2)
            .with_reconnect_interval(Duration::from_millis(50))
            .with_request_timeout(Duration::from_millis(250));
        assert_eq!(config.headers.get("Authorization").map(String::as_str), Some("Bearer abc"));
        assert_eq!(config.reconnect_interval_ms, 50);
        assert_eq!(config.request_timeout_ms, 250);

        let endpoint = config.endpoint();
        assert_eq!(endpoint.url, "wss://tools.example.com/rpc");
        assert_eq!(endpoint.headers.len(), 1);
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        assert!(matches!(
            ClientConfig::default().validate(),
            Err(ClientError::Configuration(_))
        ));
        assert!(matches!(
            ClientConfig::new("not a url").validate(),
            Err(ClientError::Configuration(_))
        ));
        assert!(matches!(
            ClientConfig::new("http://localhost:7070").validate(),
            Err(ClientError::Configuration(msg)) if msg.contains("http")
        ));
        assert!(matches!(
            ClientConfig::new("ws://localhost:7070").with_event_capacity(0).validate(),
            Err(ClientError::Configuration(_))
        ));
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: ClientConfig = serde_json::from_value(serde_json::json!({
            "url": "ws://127.0.0.1:9000",
            "reconnect": false
        }))
        .unwrap();
        assert_eq!(config.url, "ws://127.0.0.1:9000");
        assert!(!config.reconnect);
        assert_eq!(config.reconnect_attempts, 5);
        assert_eq!(config.event_capacity, 256);
    }
}
