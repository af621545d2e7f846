//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → duration.rs resolves the refresh interval at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod duration;
pub mod loader;
pub mod schema;
pub mod validation;

pub use duration::{parse_duration, refresh_interval_or_default, DEFAULT_REFRESH_INTERVAL};
pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ListenerConfig, ObservabilityConfig, ProxyConfig, SourcesConfig, TimeoutConfig, TlsConfig,
    UpstreamConfig, WarpConfig,
};
pub use validation::{validate_config, ValidationError};
