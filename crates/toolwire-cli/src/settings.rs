//! Layered client configuration: file, then `TOOLWIRE_*` environment, then flags.

use config::{Config, Environment, File};
use toolwire_client::ClientConfig;

use crate::cli::ConnectionArgs;
use crate::error::{CliError, CliResult};

/// Environment variable prefix (`TOOLWIRE_URL`, `TOOLWIRE_RECONNECT_ATTEMPTS`, ...)
pub const ENV_PREFIX: &str = "TOOLWIRE";

/// Build the client configuration for `args`.
pub fn load(args: &ConnectionArgs) -> CliResult<ClientConfig> {
    load_with_env(args, Environment::with_prefix(ENV_PREFIX))
}

fn load_with_env(args: &ConnectionArgs, env: Environment) -> CliResult<ClientConfig> {
    let mut builder = Config::builder();
    if let Some(path) = &args.config {
        builder = builder.add_source(File::from(path.as_path()));
    }
    builder = builder
        .add_source(env.try_parsing(true))
        .set_override_option("url", args.url.clone())?
        .set_override_option("request_timeout_ms", args.timeout)?
        .set_override_option("reconnect_attempts", args.reconnect_attempts.map(u64::from))?
        .set_override_option("reconnect_interval_ms", args.reconnect_interval)?;
    if args.no_reconnect {
        builder = builder.set_override("reconnect", false)?;
    }

    let mut config: ClientConfig = builder.build()?.try_deserialize()?;
    for header in &args.headers {
        let (name, value) = parse_header(header)?;
        config.headers.insert(name, value);
    }
    config.validate()?;
    Ok(config)
}

/// Split `Name: value`.
fn parse_header(header: &str) -> CliResult<(String, String)> {
    let (name, value) = header
        .split_once(':')
        .ok_or_else(|| CliError::InvalidArguments(format!("header '{}' is not 'Name: value'", header)))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::InvalidArguments(format!("header '{}' has no name", header)));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
