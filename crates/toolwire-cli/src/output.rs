//! Output formatting

use owo_colors::OwoColorize;
use serde_json::{Value, json};
use toolwire_client::ClientEvent;

use crate::cli::OutputFormat;
use crate::error::CliResult;

/// Prints results and events in the selected format
#[derive(Debug, Clone, Copy)]
pub struct Formatter {
    format: OutputFormat,
    colored: bool,
}

impl Formatter {
    #[must_use]
    pub fn new(format: OutputFormat, colored: bool) -> Self {
        Self { format, colored }
    }

    /// Print a call result
    pub fn display_result(&self, value: &Value) -> CliResult<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(value)?),
            OutputFormat::Human => println!("{}", serde_json::to_string_pretty(value)?),
        }
        Ok(())
    }

    /// Print a client event
    pub fn display_event(&self, event: &ClientEvent) -> CliResult<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(&event_to_json(event))?),
            OutputFormat::Human => println!("{}", self.describe(event)?),
        }
        Ok(())
    }

    /// Print a one-line confirmation
    pub fn display_success(&self, message: &str) {
        match self.format {
            OutputFormat::Json => println!("{}", json!({"ok": true, "message": message})),
            OutputFormat::Human if self.colored => println!("{} {}", "✓".green(), message),
            OutputFormat::Human => println!("ok: {}", message),
        }
    }

    fn describe(&self, event: &ClientEvent) -> CliResult<String> {
        let (label, detail) = match event {
            ClientEvent::Open => ("open", String::new()),
            ClientEvent::Closed { code, reason } => ("closed", format!("code={} {}", code, reason)),
            ClientEvent::Error { cause } => ("error", cause.to_string()),
            ClientEvent::Notification { notification } => {
                let params = match &notification.params {
                    Some(params) => serde_json::to_string(params)?,
                    None => String::new(),
                };
                ("notification", format!("{} {}", notification.method, params))
            }
        };
        let label = if self.colored {
            match event {
                ClientEvent::Open => label.green().to_string(),
                ClientEvent::Closed { .. } => label.yellow().to_string(),
                ClientEvent::Error { .. } => label.red().to_string(),
                ClientEvent::Notification { .. } => label.cyan().to_string(),
            }
        } else {
            label.to_string()
        };
        Ok(format!("[{}] {}", label, detail).trim_end().to_string())
    }
}

/// JSON view of an event
pub fn event_to_json(event: &ClientEvent) -> Value {
    match event {
        ClientEvent::Open => json!({"event": "open"}),
        ClientEvent::Closed { code, reason } => {
            json!({"event": "closed", "code": code, "reason": reason})
        }
        ClientEvent::Error { cause } => json!({"event": "error", "message": cause.to_string()}),
        ClientEvent::Notification { notification } => json!({
            "event": "notification",
            "method": notification.method,
            "params": notification.params,
        }),
    }
}
