//! Gateway error taxonomy.
//!
//! Every variant is terminal: the pipeline converts it into a response at the
//! point of detection. All variants except `NotFound` render as
//! `{"error": "..."}` with CORS headers so a browser caller can read them.

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::gateway::cors::CorsHeaders;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Request path is outside the published surface.
    #[error("Not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Missing \"u\" query param")]
    MissingTarget,

    #[error("Invalid \"u\" query param")]
    MalformedTarget(#[source] url::ParseError),

    #[error("Host not allowed")]
    HostNotAllowed { host: String },

    #[error("Invalid request body")]
    BodyRead(#[source] axum::Error),

    /// The outbound call failed before a response was read. Never retried.
    #[error("Upstream request failed")]
    Upstream(#[source] BoxError),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::MissingTarget
            | GatewayError::MalformedTarget(_)
            | GatewayError::HostNotAllowed { .. }
            | GatewayError::BodyRead(_) => StatusCode::BAD_REQUEST,
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::NotFound => "not_found",
            GatewayError::Unauthorized => "unauthorized",
            GatewayError::MissingTarget => "missing_target",
            GatewayError::MalformedTarget(_) => "malformed_target",
            GatewayError::HostNotAllowed { .. } => "host_not_allowed",
            GatewayError::BodyRead(_) => "body_read",
            GatewayError::Upstream(_) => "upstream_failure",
        }
    }

    pub fn into_response(self, cors: &CorsHeaders) -> Response {
        match self {
            GatewayError::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
            err => {
                let body = json!({ "error": err.to_string() }).to_string();
                cors.respond(
                    err.status(),
                    HeaderValue::from_static("application/json"),
                    body,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_has_no_cors() {
        let cors = CorsHeaders::new("*").unwrap();
        let response = GatewayError::NotFound.into_response(&cors);

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert_eq!(body_text(response).await, "Not found");
    }

    #[tokio::test]
    async fn test_structured_errors_are_json_with_cors() {
        let cors = CorsHeaders::new("https://blog.example.com").unwrap();
        let cases = vec![
            (GatewayError::Unauthorized, 401, r#"{"error":"Unauthorized"}"#),
            (GatewayError::MissingTarget, 400, r#"{"error":"Missing \"u\" query param"}"#),
            (
                GatewayError::HostNotAllowed { host: "evil.example.com".into() },
                400,
                r#"{"error":"Host not allowed"}"#,
            ),
            (
                GatewayError::MalformedTarget(url::ParseError::RelativeUrlWithoutBase),
                400,
                r#"{"error":"Invalid \"u\" query param"}"#,
            ),
            (
                GatewayError::Upstream("connection refused".into()),
                502,
                r#"{"error":"Upstream request failed"}"#,
            ),
        ];

        for (err, status, body) in cases {
            let response = err.into_response(&cors);
            assert_eq!(response.status().as_u16(), status);
            assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
            assert_eq!(
                response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
                "https://blog.example.com"
            );
            assert_eq!(body_text(response).await, body);
        }
    }

    #[test]
    fn test_host_not_allowed_keeps_host_out_of_message() {
        let err = GatewayError::HostNotAllowed { host: "evil.example.com".into() };
        assert_eq!(err.to_string(), "Host not allowed");
        assert_eq!(err.kind(), "host_not_allowed");
    }
}
