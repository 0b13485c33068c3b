//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::{LogFormat, ProxyConfig, RedirectMode};
use crate::config::validation::{validate_config, ValidationError};

/// Environment key naming an optional TOML file loaded before the overlay.
pub const CONFIG_FILE_ENV: &str = "EDGE_CONFIG";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {reason}")]
    Env { key: &'static str, reason: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML configuration file. Missing sections and fields take their
/// defaults.
///
/// The result is not validated yet; the environment overlay may still fill
/// in required fields.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Build the startup configuration from the process environment.
///
/// If `EDGE_CONFIG` names a file it is parsed first; individual environment
/// keys then override its fields. The result is validated once.
pub fn load_from_env() -> Result<ProxyConfig, ConfigError> {
    let vars: Vec<(String, String)> = std::env::vars().collect();

    let mut config = match lookup(&vars, CONFIG_FILE_ENV) {
        Some(path) => load_config(Path::new(path))?,
        None => ProxyConfig::default(),
    };

    apply_env(&mut config, vars)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment-style key/value pairs onto a configuration.
///
/// Unknown keys are ignored. Empty `AUTH_USERNAME`/`AUTH_PASSWORD` count as
/// unset, which keeps the auth gate disabled.
pub fn apply_env<I, K, V>(config: &mut ProxyConfig, vars: I) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    for (key, value) in vars {
        let value = value.as_ref();
        match key.as_ref() {
            "LISTEN_ADDR" => config.listener.bind_address = value.to_string(),
            "UPSTREAM_BASE_URL" => config.upstream.base_url = value.trim().to_string(),
            "REDIRECT_MODE" => config.upstream.redirect_mode = parse::<RedirectMode>("REDIRECT_MODE", value)?,
            "UPSTREAM_CONNECT_TIMEOUT_MS" => {
                config.upstream.connect_timeout_ms = parse("UPSTREAM_CONNECT_TIMEOUT_MS", value)?
            }
            "UPSTREAM_RESPONSE_TIMEOUT_MS" => {
                config.upstream.response_timeout_ms = parse("UPSTREAM_RESPONSE_TIMEOUT_MS", value)?
            }
            "AUTH_USERNAME" => config.auth.username = non_empty(value),
            "AUTH_PASSWORD" => config.auth.password = non_empty(value),
            "AUTH_REALM" => config.auth.realm = value.to_string(),
            "STREAM_DISABLE_PROXY_BUFFERING" => {
                config.streaming.disable_proxy_buffering = parse("STREAM_DISABLE_PROXY_BUFFERING", value)?
            }
            "LOG_LEVEL" => config.observability.log_level = value.to_string(),
            "LOG_FORMAT" => config.observability.log_format = parse::<LogFormat>("LOG_FORMAT", value)?,
            "METRICS_ENABLED" => config.observability.metrics_enabled = parse("METRICS_ENABLED", value)?,
            "METRICS_ADDR" => config.observability.metrics_address = value.to_string(),
            _ => {}
        }
    }
    Ok(())
}

fn lookup<'a>(vars: &'a [(String, String)], key: &str) -> Option<&'a str> {
    vars.iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .filter(|v| !v.is_empty())
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::Env {
        key,
        reason: e.to_string(),
    })
}
