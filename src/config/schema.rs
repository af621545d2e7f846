//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::provider::{cloudflare, cloudfront};

/// Root configuration for the edge-aware proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Where rewritten requests are forwarded.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Edge trust filter settings.
    pub warp: WarpConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration. When set, requests count as TLS-terminated.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Upstream the proxy forwards to.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Edge trust filter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WarpConfig {
    /// Filter instance name, used in logs.
    pub name: String,

    /// Provider mode: "cloudflare", "cloudfront" or "auto".
    pub provider: String,

    /// Extra CIDRs per provider, merged on every rebuild.
    pub trust_ip: BTreeMap<String, Vec<String>>,

    /// Periodically re-fetch provider ranges.
    pub auto_refresh: bool,

    /// Refresh interval, e.g. "12h" or "1h30m".
    pub refresh_interval: String,

    /// Log every trust decision at info level.
    pub debug: bool,

    /// Where provider ranges are fetched from.
    pub sources: SourcesConfig,
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self {
            name: "edge-warp".to_string(),
            provider: "auto".to_string(),
            trust_ip: BTreeMap::new(),
            auto_refresh: true,
            refresh_interval: "12h".to_string(),
            debug: false,
            sources: SourcesConfig::default(),
        }
    }
}

/// Provider range endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Plain-text Cloudflare lists (IPv4 and IPv6).
    pub cloudflare_urls: Vec<String>,

    /// CloudFront JSON document.
    pub cloudfront_url: String,

    /// Per-request fetch timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            cloudflare_urls: cloudflare::DEFAULT_URLS.iter().map(|s| s.to_string()).collect(),
            cloudfront_url: cloudfront::DEFAULT_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
