//! Startup orchestration.
//!
//! Builds the subsystems in dependency order from an already validated
//! config: metrics recorder, upstream client, gateway, then the server.
//! Any failure here is fatal.

use std::sync::Arc;

use axum::http::header::InvalidHeaderValue;
use thiserror::Error;

use crate::config::ProxyConfig;
use crate::gateway::{Gateway, HttpUpstream};
use crate::http::HttpServer;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid allow_origin header value: {0}")]
    Origin(#[from] InvalidHeaderValue),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("failed to install metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

/// Wire the production gateway and server for `config`.
pub fn build_server(config: Arc<ProxyConfig>) -> Result<HttpServer, StartupError> {
    let observability = &config.observability;
    if observability.metrics_enabled {
        let addr = observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let upstream = HttpUpstream::new(&config.upstream)?;
    let gateway = Gateway::new(&config, upstream)?;

    tracing::info!(
        path = %config.gateway.path,
        allow_origin = %config.gateway.allow_origin,
        allowed_hosts = ?config.gateway.allowed_hosts,
        token_required = config.gateway.auth_token.is_some(),
        "Gateway configured"
    );

    Ok(HttpServer::new(config, gateway))
}
