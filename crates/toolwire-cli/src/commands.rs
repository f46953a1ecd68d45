//! Command execution

use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use toolwire_client::{ClientEvent, ClientResult, ToolClient, ToolInvocation, ToolRegistration};
use tracing::{debug, warn};

use crate::cli::Commands;
use crate::error::{CliError, CliResult};
use crate::output::Formatter;

/// Run one command on a fresh connection, then disconnect.
pub async fn execute(client: &ToolClient, command: Commands, formatter: &Formatter) -> CliResult<()> {
    match command {
        Commands::Call { method, params } => {
            let params = parse_optional_json(params.as_deref(), "params")?;
            let result = connected(client, client.call(&method, params)).await?;
            formatter.display_result(&result)
        }
        Commands::Notify { method, params } => {
            let params = parse_optional_json(params.as_deref(), "params")?;
            connected(client, client.notify(&method, params)).await?;
            formatter.display_success(&format!("notified {}", method));
            Ok(())
        }
        Commands::Invoke { name, arguments } => {
            let mut invocation = ToolInvocation::new(name);
            if let Some(arguments) = parse_optional_json(arguments.as_deref(), "arguments")? {
                invocation = invocation.with_arguments(arguments);
            }
            let result = connected(client, client.invoke_tool(&invocation)).await?;
            formatter.display_result(&result)
        }
        Commands::Register {
            name,
            description,
            schema,
        } => {
            let schema = parse_json(&schema, "schema")?;
            let tool = ToolRegistration::new(name.clone(), description, schema);
            connected(client, client.register_tool(&tool)).await?;
            formatter.display_success(&format!("registered {}", name));
            Ok(())
        }
        Commands::Listen { count } => listen(client, count, formatter).await,
    }
}

/// Connect, await `operation`, then disconnect whatever it returned.
async fn connected<T>(
    client: &ToolClient,
    operation: impl Future<Output = ClientResult<T>>,
) -> CliResult<T> {
    client.connect().await?;
    let outcome = operation.await;
    if let Err(e) = client.disconnect().await {
        debug!("disconnect failed: {}", e);
    }
    Ok(outcome?)
}

/// Print events until Ctrl-C, or until `count` notifications were seen.
async fn listen(client: &ToolClient, count: Option<usize>, formatter: &Formatter) -> CliResult<()> {
    let mut events = client.subscribe();
    client.connect().await?;

    let mut seen = 0usize;
    loop {
        if count.is_some_and(|limit| seen >= limit) {
            break;
        }
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                break;
            }
            event = events.recv() => match event {
                Ok(event) => {
                    if matches!(event, ClientEvent::Notification { .. }) {
                        seen += 1;
                    }
                    formatter.display_event(&event)?;
                }
                Err(RecvError::Lagged(skipped)) => warn!("skipped {} events", skipped),
                Err(RecvError::Closed) => break,
            },
        }
    }

    client.disconnect().await?;
    Ok(())
}

fn parse_optional_json(raw: Option<&str>, what: &str) -> CliResult<Option<Value>> {
    raw.map(|raw| parse_json(raw, what)).transpose()
}

fn parse_json(raw: &str, what: &str) -> CliResult<Value> {
    serde_json::from_str(raw)
        .map_err(|e| CliError::InvalidArguments(format!("{} is not valid JSON: {}", what, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_optional_json() {
        assert_eq!(parse_optional_json(None, "params").unwrap(), None);
        assert_eq!(
            parse_optional_json(Some(r#"{"a": [1, 2]}"#), "params").unwrap(),
            Some(json!({"a": [1, 2]}))
        );
    }

    #[test]
    fn test_parse_json_error_names_argument() {
        let err = parse_json("{oops", "arguments").unwrap_err();
        assert!(matches!(err, CliError::InvalidArguments(ref msg) if msg.starts_with("arguments")));
    }
}
