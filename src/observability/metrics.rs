//! Metrics collection and exposition.
//!
//! # Metrics
//! - `overlay_proxy_requests_total` (counter): requests by method, status, outcome
//! - `overlay_proxy_request_duration_seconds` (histogram): latency by outcome
//!
//! `outcome` is `preflight`, `forwarded`, or the rejection kind
//! (`unauthorized`, `host_not_allowed`, `upstream_failure`, ...).
//! `method` is one of the standard verbs or `other`; clients choose the
//! method, so it must not mint new series.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const REQUESTS_TOTAL: &str = "overlay_proxy_requests_total";
pub const REQUEST_DURATION: &str = "overlay_proxy_request_duration_seconds";

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!(REQUESTS_TOTAL, "Total requests handled by the gateway");
    describe_histogram!(
        REQUEST_DURATION,
        "Time from request arrival to response, in seconds"
    );

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Collapse a request method onto a fixed label set.
pub fn method_label(method: &str) -> &'static str {
    match method {
        "GET" => "GET",
        "HEAD" => "HEAD",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "OPTIONS" => "OPTIONS",
        "PATCH" => "PATCH",
        _ => "other",
    }
}

pub fn record_request(method: &str, status: u16, outcome: &'static str, start: Instant) {
    counter!(
        REQUESTS_TOTAL,
        "method" => method_label(method),
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!(REQUEST_DURATION, "outcome" => outcome).record(start.elapsed().as_secs_f64());
}
