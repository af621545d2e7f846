//! Edge trust engine.
//!
//! # Data Flow
//! ```text
//! Per request (synchronous, no I/O):
//!     peer address string
//!     → extract.rs (host:port parsing)
//!     → classifier.rs (membership against one registry snapshot)
//!     → TrustResult
//!
//! Background (refresh.rs):
//!     timer → CidrSource::fetch → merge overrides → RangeSet::build
//!     → registry.rs atomic swap
//! ```
//!
//! # Design Decisions
//! - Trust depends on the transport peer and the registry only
//! - Registry readers never block on the refresher

use thiserror::Error;

pub mod classifier;
pub mod extract;
pub mod refresh;
pub mod registry;

pub use classifier::{classify, TrustResult};
pub use extract::extract_client_ip;
pub use refresh::{AllowlistRefresher, Overrides, RefreshReport};
pub use registry::{CidrRegistry, RangeSet};

/// Per-request classification failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrustError {
    /// The peer address handed over by the server is not an IP literal.
    #[error("malformed peer address {0:?}")]
    MalformedPeerAddress(String),
}
