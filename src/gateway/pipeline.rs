//! The forwarding pipeline.
//!
//! ```text
//! OPTIONS ───────────────────────────────────────────────▶ 204 + CORS
//! path gate → token gate → target → allowlist → plan ──▶ upstream ──▶ relay
//!     │           │          │          │
//!     ▼           ▼          ▼          ▼
//!    404         401        400        400        (GatewayError)
//! ```
//!
//! Each request is independent; the only shared state is the immutable
//! configuration. Dropping the future returned by [`Gateway::handle`] (for
//! example when the client disconnects) drops the in-flight upstream call
//! with it.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    http::{
        header::{self, InvalidHeaderValue},
        HeaderValue, Method, Request,
    },
    response::Response,
};

use crate::config::{GatewayConfig, ProxyConfig};
use crate::error::GatewayError;
use crate::gateway::cors::CorsHeaders;
use crate::gateway::target::{extract_target, target_host, HostAllowlist};
use crate::gateway::upstream::{decode_text, OutboundRequest, Upstream, UpstreamResponse};
use crate::http::request::{joined_header, request_id};
use crate::observability::metrics;
use crate::security::TokenGate;

fn default_content_type() -> HeaderValue {
    HeaderValue::from_static("application/json")
}

pub struct Gateway<U> {
    config: Arc<GatewayConfig>,
    cors: CorsHeaders,
    tokens: TokenGate,
    allowlist: HostAllowlist,
    max_body_size: usize,
    upstream: U,
}

impl<U: Upstream> Gateway<U> {
    pub fn new(config: &ProxyConfig, upstream: U) -> Result<Self, InvalidHeaderValue> {
        let gateway = &config.gateway;
        Ok(Self {
            cors: CorsHeaders::new(&gateway.allow_origin)?,
            tokens: TokenGate::from_config(gateway.auth_token.as_deref()),
            allowlist: HostAllowlist::new(gateway.allowed_hosts.iter().cloned()),
            max_body_size: config.security.max_body_size,
            config: Arc::new(gateway.clone()),
            upstream,
        })
    }

    /// Handle one inbound request. Always produces a response; every
    /// rejection is rendered by [`GatewayError::into_response`].
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let method = request.method().clone();
        let request_id = request_id(request.headers()).to_string();

        if method == Method::OPTIONS {
            tracing::debug!(request_id = %request_id, path = %request.uri().path(), "Preflight");
            let response = self.cors.preflight();
            metrics::record_request(method.as_str(), response.status().as_u16(), "preflight", start);
            return response;
        }

        match self.forward(request, &request_id).await {
            Ok(response) => {
                metrics::record_request(method.as_str(), response.status().as_u16(), "forwarded", start);
                response
            }
            Err(err) => {
                match &err {
                    GatewayError::Upstream(cause) => tracing::error!(
                        request_id = %request_id,
                        error = %cause,
                        "Upstream request failed"
                    ),
                    GatewayError::HostNotAllowed { host } => tracing::warn!(
                        request_id = %request_id,
                        host = %host,
                        "Rejected target host"
                    ),
                    other => tracing::debug!(
                        request_id = %request_id,
                        reason = other.kind(),
                        "Rejected request"
                    ),
                }
                metrics::record_request(method.as_str(), err.status().as_u16(), err.kind(), start);
                err.into_response(&self.cors)
            }
        }
    }

    async fn forward(&self, request: Request<Body>, request_id: &str) -> Result<Response, GatewayError> {
        let outbound = self.plan(request).await?;
        tracing::debug!(
            request_id = %request_id,
            method = %outbound.method,
            target = %outbound.url,
            "Forwarding request"
        );

        let upstream = self.upstream.send(outbound).await?;
        tracing::debug!(request_id = %request_id, status = %upstream.status, "Upstream responded");
        Ok(self.relay(upstream))
    }

    /// Run the validation gates and build the outbound request.
    pub async fn plan(&self, request: Request<Body>) -> Result<OutboundRequest, GatewayError> {
        let (parts, body) = request.into_parts();

        if parts.uri.path() != self.config.path {
            return Err(GatewayError::NotFound);
        }

        self.tokens.check(&parts.headers)?;

        let url = extract_target(parts.uri.query())?;
        let host = target_host(&url);
        if !self.allowlist.contains(&host) {
            return Err(GatewayError::HostNotAllowed { host });
        }

        let content_type = joined_header(&parts.headers, header::CONTENT_TYPE)
            .unwrap_or_else(default_content_type);
        let authorization = joined_header(&parts.headers, header::AUTHORIZATION);

        let body = if parts.method == Method::GET || parts.method == Method::HEAD {
            None
        } else {
            let bytes = axum::body::to_bytes(body, self.max_body_size)
                .await
                .map_err(GatewayError::BodyRead)?;
            Some(decode_text(&bytes))
        };

        Ok(OutboundRequest {
            method: parts.method,
            url,
            content_type,
            authorization,
            body,
        })
    }

    fn relay(&self, upstream: UpstreamResponse) -> Response {
        let content_type = upstream
            .content_type
            .filter(|value| !value.is_empty())
            .unwrap_or_else(default_content_type);
        self.cors.respond(upstream.status, content_type, upstream.body)
    }
}
