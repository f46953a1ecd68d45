//! CLI argument parsing

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Main CLI application structure
#[derive(Parser, Debug)]
#[command(
    name = "toolwire",
    version,
    about = "Talk to JSON-RPC tool servers over WebSocket",
    long_about = "toolwire connects to a JSON-RPC 2.0 tool server, sends requests and notifications,\n\
                  invokes and registers tools, and prints server-pushed notifications.\n\n\
                  Settings are layered: --config file, then TOOLWIRE_* environment variables,\n\
                  then command-line flags."
)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Connection settings
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Where and how to connect
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Configuration file (toml, json or yaml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Server URL (ws:// or wss://)
    #[arg(long, short = 'u', global = true)]
    pub url: Option<String>,

    /// Extra handshake header, 'Name: value' (repeatable)
    #[arg(long = "header", short = 'H', global = true)]
    pub headers: Vec<String>,

    /// Request timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Do not reconnect after unexpected closes
    #[arg(long, global = true)]
    pub no_reconnect: bool,

    /// Maximum reconnection attempts
    #[arg(long, global = true)]
    pub reconnect_attempts: Option<u32>,

    /// Delay between reconnection attempts in milliseconds
    #[arg(long, global = true)]
    pub reconnect_interval: Option<u64>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a request and print its result
    Call {
        /// Method name
        method: String,

        /// Parameters as JSON
        #[arg(long, short = 'p')]
        params: Option<String>,
    },

    /// Send a notification
    Notify {
        /// Method name
        method: String,

        /// Parameters as JSON
        #[arg(long, short = 'p')]
        params: Option<String>,
    },

    /// Invoke a remote tool
    Invoke {
        /// Tool name
        name: String,

        /// Arguments as JSON
        #[arg(long, short = 'a')]
        arguments: Option<String>,
    },

    /// Register a tool with the server
    Register {
        /// Tool name
        name: String,

        /// Tool description
        #[arg(long, short = 'd', default_value = "")]
        description: String,

        /// Input schema as JSON
        #[arg(long, short = 's', default_value = r#"{"type":"object"}"#)]
        schema: String,
    },

    /// Print notifications and lifecycle events until Ctrl-C
    Listen {
        /// Stop after this many notifications
        #[arg(long, short = 'n')]
        count: Option<usize>,
    },
}

/// Output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable with colors
    Human,
    /// One JSON document per line
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_call_with_global_flags() {
        let cli = Cli::try_parse_from([
            "toolwire",
            "call",
            "echo",
            "--params",
            r#"{"a":1}"#,
            "--url",
            "ws://127.0.0.1:7070",
            "-H",
            "Authorization: Bearer t",
            "--format",
            "json",
        ])
        .unwrap();

        assert!(matches!(
            cli.command,
            Commands::Call { ref method, params: Some(ref p) } if method == "echo" && p == r#"{"a":1}"#
        ));
        assert_eq!(cli.connection.url.as_deref(), Some("ws://127.0.0.1:7070"));
        assert_eq!(cli.connection.headers, vec!["Authorization: Bearer t".to_string()]);
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_register_defaults() {
        let cli = Cli::try_parse_from(["toolwire", "register", "read_file"]).unwrap();
        match cli.command {
            Commands::Register {
                name,
                description,
                schema,
            } => {
                assert_eq!(name, "read_file");
                assert_eq!(description, "");
                assert_eq!(schema, r#"{"type":"object"}"#);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.format, OutputFormat::Human);
    }

    #[test]
    fn test_listen_count() {
        let cli = Cli::try_parse_from(["toolwire", "listen", "-n", "3", "--no-reconnect"]).unwrap();
        assert!(matches!(cli.command, Commands::Listen { count: Some(3) }));
        assert!(cli.connection.no_reconnect);
    }

    #[test]
    fn test_missing_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["toolwire"]).is_err());
    }
}
