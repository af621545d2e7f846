//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Metrics are cheap (atomic increments) and no-ops until a recorder is installed
//! - Trust decisions are logged per request only at debug level unless the
//!   filter runs with `debug = true`

pub mod logging;
pub mod metrics;
