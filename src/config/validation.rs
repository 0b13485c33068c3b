//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the upstream origin is a usable http(s) URL
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("upstream base URL is required")]
    MissingUpstream,

    #[error("upstream base URL '{url}' is invalid: {reason}")]
    InvalidUpstream { url: String, reason: String },

    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("auth realm must be non-empty and must not contain '\"'")]
    InvalidRealm,

    #[error("{field} '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let base = config.upstream.base_url.trim();
    if base.is_empty() {
        errors.push(ValidationError::MissingUpstream);
    } else if let Err(reason) = check_upstream_url(base) {
        errors.push(ValidationError::InvalidUpstream {
            url: base.to_string(),
            reason,
        });
    }

    if config.upstream.connect_timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout {
            field: "upstream.connect_timeout_ms",
        });
    }
    if config.upstream.response_timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout {
            field: "upstream.response_timeout_ms",
        });
    }

    let realm = &config.auth.realm;
    if realm.is_empty() || realm.contains('"') {
        errors.push(ValidationError::InvalidRealm);
    }

    check_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_upstream_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(())
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
