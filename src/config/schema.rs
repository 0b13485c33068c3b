//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the edge gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The single upstream origin all traffic is forwarded to.
    pub upstream: UpstreamConfig,

    /// Optional Basic auth gate.
    pub auth: AuthConfig,

    /// Event-stream response handling.
    pub streaming: StreamingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Scheme and host of the backend (e.g., "https://backend.example").
    pub base_url: String,

    /// Whether 3xx responses are followed or surfaced to the caller.
    pub redirect_mode: RedirectMode,

    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Time allowed for the upstream to produce response headers, in milliseconds.
    /// The window starts when the request is issued, so it also covers
    /// uploading the request body: a slow upload that outlasts it ends in
    /// 504. Does not bound how long a streamed response body may stay open.
    pub response_timeout_ms: u64,
}

impl UpstreamConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            redirect_mode: RedirectMode::Follow,
            connect_timeout_ms: 5_000,
            response_timeout_ms: 60_000,
        }
    }
}

/// Redirect handling for upstream responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RedirectMode {
    /// Return 3xx responses to the caller untouched.
    Manual,
    /// Follow redirects inside the gateway.
    #[default]
    Follow,
}

impl FromStr for RedirectMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(RedirectMode::Manual),
            "follow" => Ok(RedirectMode::Follow),
            other => Err(format!("unknown redirect mode '{}' (expected manual or follow)", other)),
        }
    }
}

impl fmt::Display for RedirectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectMode::Manual => f.write_str("manual"),
            RedirectMode::Follow => f.write_str("follow"),
        }
    }
}

/// Basic auth gate configuration.
///
/// The gate is active only when `password` is set and non-empty.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Expected username. When unset, any username is accepted.
    pub username: Option<String>,

    /// Expected secret. Presence enables the gate.
    pub password: Option<String>,

    /// Realm advertised in the `WWW-Authenticate` challenge.
    pub realm: String,
}

impl AuthConfig {
    /// Whether requests must present credentials.
    pub fn is_enabled(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            realm: "Restricted".to_string(),
        }
    }
}

// Hand-written so the secret never reaches a log line.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("realm", &self.realm)
            .finish()
    }
}

/// Event-stream handling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Add `X-Accel-Buffering: no` to event-stream responses.
    pub disable_proxy_buffering: bool,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            disable_proxy_buffering: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}' (expected pretty or json)", other)),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty output for development, JSON for production.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_disabled_without_password() {
        let mut auth = AuthConfig::default();
        assert!(!auth.is_enabled());

        auth.password = Some(String::new());
        assert!(!auth.is_enabled());

        auth.password = Some("hunter2".into());
        assert!(auth.is_enabled());
    }

    #[test]
    fn debug_output_redacts_password() {
        let auth = AuthConfig {
            username: Some("ops".into()),
            password: Some("hunter2".into()),
            realm: "Edge".into(),
        };
        let rendered = format!("{:?}", auth);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn redirect_mode_parses_case_insensitively() {
        assert_eq!("MANUAL".parse::<RedirectMode>(), Ok(RedirectMode::Manual));
        assert_eq!("follow".parse::<RedirectMode>(), Ok(RedirectMode::Follow));
        assert!("sometimes".parse::<RedirectMode>().is_err());
        assert_eq!(RedirectMode::default(), RedirectMode::Follow);
    }

    #[test]
    fn toml_sections_fill_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [upstream]
            base_url = "https://backend.example"
            redirect_mode = "manual"

            [auth]
            password = "s3cret"
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.base_url, "https://backend.example");
        assert_eq!(config.upstream.redirect_mode, RedirectMode::Manual);
        assert_eq!(config.upstream.connect_timeout_ms, 5_000);
        assert_eq!(config.auth.realm, "Restricted");
        assert!(config.auth.is_enabled());
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert!(config.streaming.disable_proxy_buffering);
    }
}
