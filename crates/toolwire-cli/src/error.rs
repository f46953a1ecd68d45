//! CLI error types

use std::time::Duration;

use thiserror::Error;
use toolwire_client::ClientError;

/// Errors reported by the `toolwire` binary
#[derive(Error, Debug)]
pub enum CliError {
    /// Client or connection failure
    #[error("Client error: {0}")]
    Client(ClientError),

    /// The server answered with an error object
    #[error("Server error [{code}]: {message}")]
    ServerError { code: i32, message: String },

    /// No response in time
    #[error("Operation '{operation}' timed out after {elapsed:?}")]
    Timeout {
        operation: String,
        elapsed: Duration,
    },

    /// Invalid command arguments
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl From<ClientError> for CliError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Remote { code, message, .. } => Self::ServerError { code, message },
            ClientError::Timeout { method, timeout } => Self::Timeout {
                operation: method,
                elapsed: timeout,
            },
            other => Self::Client(other),
        }
    }
}

impl CliError {
    /// Hints printed under the error message
    pub fn suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Client(err) if err.is_connection_error() => vec![
                "Check that the tool server is running",
                "Verify the --url value (ws:// or wss://)",
            ],
            Self::Client(ClientError::Configuration(_)) => vec![
                "Pass --url, set TOOLWIRE_URL, or add url to the --config file",
            ],
            Self::Timeout { .. } => vec![
                "Increase the timeout with --timeout",
                "Check server responsiveness",
            ],
            Self::InvalidArguments(_) => vec![
                "Parameters must be valid JSON, e.g. '{\"path\": \"README.md\"}'",
                "Headers use the form 'Name: value'",
            ],
            _ => vec![],
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
