//! Request identification.
//!
//! Every inbound request gets an `x-request-id` (UUID v4) unless the client
//! already supplied one. The same value is echoed on the response and
//! attached to the gateway's log lines.

use axum::http::{header::AsHeaderName, HeaderMap, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The request ID carried in `headers`, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Every non-empty value of a header, joined with `", "` in arrival order.
/// `None` when the header is absent or all of its values are empty.
pub fn joined_header<K: AsHeaderName>(headers: &HeaderMap, name: K) -> Option<HeaderValue> {
    let values: Vec<&HeaderValue> = headers
        .get_all(name)
        .iter()
        .filter(|value| !value.is_empty())
        .collect();

    match values.as_slice() {
        [] => None,
        [single] => Some((*single).clone()),
        many => {
            let joined = many
                .iter()
                .map(|value| value.as_bytes())
                .collect::<Vec<_>>()
                .join(&b", "[..]);
            HeaderValue::from_bytes(&joined).ok()
        }
    }
}
