//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Engine, middleware, transport produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint
//! ```
//!
//! # Design Decisions
//! - Request ID (`x-request-id`) is attached to request log events
//! - Metrics recording is cheap and safe without an exporter

pub mod logging;
pub mod metrics;
