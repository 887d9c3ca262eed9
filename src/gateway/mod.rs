//! Forwarding gateway subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → pipeline.rs (preflight, path gate, token gate)
//!     → target.rs (extract `u`, host allowlist)
//!     → upstream.rs (single outbound call, no redirects)
//!     → pipeline.rs relay (status + body + content type)
//!     → cors.rs (Access-Control-* headers)
//! ```
//!
//! # Design Decisions
//! - The gates form a short-circuiting chain returning `GatewayError`
//! - Only `Content-Type` and `Authorization` are forwarded upstream
//! - Bodies are handled as text in both directions

pub mod cors;
pub mod pipeline;
pub mod target;
pub mod upstream;

pub use cors::CorsHeaders;
pub use pipeline::Gateway;
pub use target::{extract_target, target_host, HostAllowlist};
pub use upstream::{HttpUpstream, OutboundRequest, Upstream, UpstreamResponse};
