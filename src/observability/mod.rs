//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty for development, JSON for aggregation)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! Credential failures are logged at debug level without the token value.
//! Configuration problems are logged at error level.

pub mod logging;
pub mod metrics;
