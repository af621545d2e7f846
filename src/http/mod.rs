//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, tracing and timeout layers)
//!     → security::edge_trust (classify peer, rewrite forwarding headers)
//!     → server.rs forwarder (hyper-util client to the upstream)
//!     → Send response to client
//! ```

pub mod server;

pub use server::{HttpServer, ServerError};
