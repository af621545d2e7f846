//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Logging/metrics → Edge trust filter
//!     (initial CIDR build) → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Stop refresher → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then the filter, then listeners
//! - Listeners start last (traffic only once the registry is populated)

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
