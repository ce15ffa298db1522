//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and histograms via the metrics facade)
//!
//! Consumers:
//!     → stdout (pretty or compact format)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every HTTP log line
//! - Metrics are cheap (no-ops until an exporter is installed)
//! - Breaker transitions are logged and counted from one listener

pub mod logging;
pub mod metrics;
