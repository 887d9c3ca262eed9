//! Allowlisted HTTP forwarding proxy library.
//!
//! A browser front end calls `/overlay-proxy?u=<url>`; the gateway checks the
//! optional shared secret and the target host against an allowlist, makes
//! one outbound call, and relays the response with CORS headers attached.

pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::ProxyConfig;
pub use error::GatewayError;
pub use gateway::Gateway;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
