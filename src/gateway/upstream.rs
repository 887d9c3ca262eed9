//! The single outbound call.
//!
//! `Upstream` is the seam between the pipeline and the network; the
//! production implementation is a `reqwest` client that never follows
//! redirects and keeps no idle connections, so every forwarded request is an
//! independent call.

use std::future::Future;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method, StatusCode};
use url::Url;

use crate::config::UpstreamConfig;
use crate::error::GatewayError;

/// A fully validated request ready to be sent upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub content_type: HeaderValue,
    pub authorization: Option<HeaderValue>,
    /// Absent for GET and HEAD.
    pub body: Option<String>,
}

/// What is relayed back from the upstream.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: String,
}

/// Decode a body as UTF-8 text, replacing invalid sequences and dropping a
/// leading byte order mark.
pub fn decode_text(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text.into_owned(),
    }
}

pub trait Upstream: Send + Sync + 'static {
    fn send(
        &self,
        request: OutboundRequest,
    ) -> impl Future<Output = Result<UpstreamResponse, GatewayError>> + Send;
}

/// HTTP(S) upstream backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .pool_max_idle_per_host(0)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl Upstream for HttpUpstream {
    async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse, GatewayError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .header(header::CONTENT_TYPE, request.content_type);
        if let Some(authorization) = request.authorization {
            builder = builder.header(header::AUTHORIZATION, authorization);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::Upstream(e.into()))?;
        let status = response.status();
        let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Upstream(e.into()))?;

        Ok(UpstreamResponse {
            status,
            content_type,
            body: decode_text(&bytes),
        })
    }
}
