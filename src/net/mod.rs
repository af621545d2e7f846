//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → plain: tokio TcpListener via axum::serve
//!     → TLS: tls.rs (rustls config) via axum-server
//!     → Hand off to HTTP layer with ConnectInfo<SocketAddr>
//! ```

pub mod tls;
