//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request + transport peer:
//!     → edge_trust.rs (middleware, classify against the registry snapshot)
//!     → headers.rs (strip inbound forwarding, write X-Forwarded-* and markers)
//!     → Pass to upstream forwarding
//! ```
//!
//! # Design Decisions
//! - Fail closed: an unusable peer address is rejected with 400
//! - No trust in client input; only the peer decides whether provider headers count

pub mod edge_trust;
pub mod headers;

pub use edge_trust::{edge_trust_middleware, ConnectionTls, EdgeTrust, WarpError};
pub use headers::{Forwarded, IpSource};
