//! Configuration validation.
//!
//! Serde handles syntax; this module checks the values make sense before the
//! config is accepted. Validation is a pure function that reports every
//! problem it finds rather than stopping at the first.

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a fully layered configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let gateway = &config.gateway;
    if !gateway.path.starts_with('/') {
        errors.push(ValidationError::new("gateway.path", "must start with '/'"));
    }
    if HeaderValue::from_str(&gateway.allow_origin).is_err() {
        errors.push(ValidationError::new(
            "gateway.allow_origin",
            "is not a valid header value",
        ));
    }
    if gateway.allowed_hosts.is_empty() {
        errors.push(ValidationError::new(
            "gateway.allowed_hosts",
            "at least one host is required",
        ));
    }
    for host in &gateway.allowed_hosts {
        if let Some(problem) = host_entry_problem(host) {
            errors.push(ValidationError::new(
                "gateway.allowed_hosts",
                format!("'{}' {}", host, problem),
            ));
        }
    }
    if let Some(token) = &gateway.auth_token {
        if HeaderValue::from_str(token).is_err() {
            errors.push(ValidationError::new(
                "gateway.auth_token",
                "is not a valid header value",
            ));
        }
    }

    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "upstream.connect_timeout_secs",
            "must be greater than zero",
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must be greater than zero",
        ));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new(
            "security.max_body_size",
            "must be greater than zero",
        ));
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Allowlist entries are compared verbatim against `host[:port]`, so anything
/// that could never equal a serialized URL host is a configuration mistake.
fn host_entry_problem(host: &str) -> Option<&'static str> {
    if host.is_empty() {
        Some("is empty")
    } else if host.contains("://") {
        Some("must not include a scheme")
    } else if host.contains('/') {
        Some("must not include a path")
    } else if host.chars().any(char::is_whitespace) {
        Some("must not contain whitespace")
    } else {
        None
    }
}
