//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! gateway + http layers produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (request counters and latency histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Prometheus scrape endpoint (when enabled)
//! ```
//!
//! # Design Decisions
//! - Request ID (`x-request-id`) is attached to every gateway log line
//! - Metrics calls are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
