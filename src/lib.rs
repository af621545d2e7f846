//! Edge-aware reverse proxy library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod provider;
pub mod security;
pub mod trust;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use provider::Provider;
pub use security::{edge_trust_middleware, EdgeTrust};
