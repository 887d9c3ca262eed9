//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (after preflight and path checks):
//!     → token.rs (optional shared-secret header)
//!     → gateway target checks (host allowlist)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a configured token must be presented exactly
//! - Only `Content-Type` and `Authorization` ever leave for the upstream

pub mod token;

pub use token::{TokenGate, PROXY_TOKEN_HEADER};
