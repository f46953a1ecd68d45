//! # Toolwire CLI
//!
//! Command-line client for JSON-RPC 2.0 tool servers, built on
//! `toolwire-client`.
//!
//! ## Usage
//!
//! ```bash
//! # Call a method
//! toolwire call echo --params '{"text": "hi"}' --url ws://127.0.0.1:7070
//!
//! # Invoke a tool
//! toolwire invoke read_file --arguments '{"path": "README.md"}'
//!
//! # Register a tool
//! toolwire register read_file -d "Read a file" -s '{"type":"object"}'
//!
//! # Watch notifications as JSON lines
//! toolwire listen --format json
//! ```
//!
//! Settings come from `--config`, then `TOOLWIRE_*` environment variables,
//! then flags. Logging follows `RUST_LOG`; `--verbose` forces `debug`.

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod settings;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub use cli::{Cli, Commands, ConnectionArgs, OutputFormat};
pub use error::{CliError, CliResult};

use toolwire_client::ToolClient;

/// Run the CLI application
pub async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = settings::load(&cli.connection)?;
    let client = ToolClient::websocket(config)?;
    let formatter = output::Formatter::new(cli.format, !cli.no_color);

    commands::execute(&client, cli.command, &formatter).await
}

/// Log to stderr, filtered by `RUST_LOG` unless `verbose` is set.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // A subscriber may already be installed when embedded.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
