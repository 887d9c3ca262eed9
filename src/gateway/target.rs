//! Target extraction and the upstream host allowlist.
//!
//! # Design Decisions
//! - The target is the first `u` query parameter, form-urlencoded
//! - Hosts compare as exact, case-sensitive strings against `host[:port]`
//! - Default ports are omitted by URL serialization, so `example.com:443`
//!   in the allowlist never matches `https://example.com/`

use url::{form_urlencoded, Url};

use crate::error::GatewayError;

/// Query parameter carrying the upstream URL.
pub const TARGET_PARAM: &str = "u";

/// Read and parse the target URL from a raw query string.
pub fn extract_target(query: Option<&str>) -> Result<Url, GatewayError> {
    let raw = query
        .and_then(|q| {
            form_urlencoded::parse(q.as_bytes())
                .find(|(key, _)| key == TARGET_PARAM)
                .map(|(_, value)| value.into_owned())
        })
        .filter(|value| !value.is_empty())
        .ok_or(GatewayError::MissingTarget)?;

    Url::parse(&raw).map_err(GatewayError::MalformedTarget)
}

/// The `hostname[:port]` of a URL as it is serialized, which is what the
/// allowlist is matched against. URLs without a host yield an empty string.
pub fn target_host(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}

/// Set of upstream hosts the gateway may forward to.
#[derive(Debug, Clone)]
pub struct HostAllowlist {
    hosts: Vec<String>,
}

impl HostAllowlist {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hosts: hosts.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, host: &str) -> bool {
        !host.is_empty() && self.hosts.iter().any(|allowed| allowed == host)
    }
}
