//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding the CORS origin.
pub const ENV_ALLOW_ORIGIN: &str = "ALLOW_ORIGIN";
/// Environment variable holding the comma-separated host allowlist.
pub const ENV_ALLOWED_HOSTS: &str = "ALLOWED_HOSTS";
/// Environment variable holding the shared secret.
pub const ENV_AUTH_TOKEN: &str = "AUTH_TOKEN";
/// Environment variable overriding the listener address.
pub const ENV_BIND_ADDRESS: &str = "PROXY_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let config = read_config_file(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Build the effective configuration: defaults, then the optional TOML file,
/// then `.env` and the process environment, then the CLI bind override.
/// Validation runs once, on the final result.
pub fn load_layered(
    path: Option<&Path>,
    bind_override: Option<&str>,
) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => ProxyConfig::default(),
    };

    match dotenvy::dotenv() {
        Ok(env_path) => tracing::debug!(path = ?env_path, "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
    }
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    if let Some(bind) = bind_override {
        config.listener.bind_address = bind.to_string();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// Empty values count as unset, so `AUTH_TOKEN=` leaves the gateway open and
/// `ALLOWED_HOSTS=` keeps the configured list.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

    if let Some(origin) = get(ENV_ALLOW_ORIGIN) {
        config.gateway.allow_origin = origin;
    }
    if let Some(hosts) = get(ENV_ALLOWED_HOSTS) {
        config.gateway.allowed_hosts = parse_host_list(&hosts);
    }
    if let Some(token) = get(ENV_AUTH_TOKEN) {
        config.gateway.auth_token = Some(token);
    }
    if let Some(bind) = get(ENV_BIND_ADDRESS) {
        config.listener.bind_address = bind;
    }

    if config.gateway.auth_token.as_deref() == Some("") {
        config.gateway.auth_token = None;
    }
}

/// Split a comma-separated host list, trimming each entry and dropping blanks.
pub fn parse_host_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(str::to_string)
        .collect()
}
