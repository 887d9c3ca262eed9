//! Shared-secret check on `X-Proxy-Token`.

use axum::http::HeaderMap;

use crate::error::GatewayError;
use crate::http::request::joined_header;

pub const PROXY_TOKEN_HEADER: &str = "x-proxy-token";

/// Gate that admits requests carrying the configured token.
/// With no token configured every request passes.
#[derive(Clone, Default)]
pub struct TokenGate {
    expected: Option<Vec<u8>>,
}

impl TokenGate {
    pub fn from_config(token: Option<&str>) -> Self {
        Self {
            expected: token
                .filter(|token| !token.is_empty())
                .map(|token| token.as_bytes().to_vec()),
        }
    }

    pub fn is_open(&self) -> bool {
        self.expected.is_none()
    }

    pub fn check(&self, headers: &HeaderMap) -> Result<(), GatewayError> {
        let Some(expected) = &self.expected else {
            return Ok(());
        };

        // Repeated headers are joined, so two copies of the token never match.
        match joined_header(headers, PROXY_TOKEN_HEADER) {
            Some(presented) if constant_time_eq(presented.as_bytes(), expected) => Ok(()),
            _ => Err(GatewayError::Unauthorized),
        }
    }
}

impl std::fmt::Debug for TokenGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGate")
            .field("open", &self.is_open())
            .finish()
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
