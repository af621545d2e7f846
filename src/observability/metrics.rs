//! Metrics collection and exposition.
//!
//! # Metrics
//! - `warp_requests_total` (counter): requests by `provider`, `trusted`
//! - `warp_malformed_peer_total` (counter): requests rejected for an unusable peer address
//! - `warp_client_ip_source_total` (counter): where the forwarded client IP came from
//! - `warp_cidr_ranges` (gauge): ranges per provider after the last build
//! - `warp_cidr_skipped_total` (counter): unparseable CIDR entries skipped
//! - `warp_refresh_total` (counter): completed registry builds
//! - `warp_fetch_fallback_total` (counter): fetches replaced by the built-in list

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::provider::Provider;
use crate::trust::RefreshReport;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_trust_decision(matched: Option<Provider>, trusted: bool) {
    let provider = matched.map(|p| p.marker()).unwrap_or("none");
    let trusted = if trusted { "true" } else { "false" };
    counter!("warp_requests_total", "provider" => provider, "trusted" => trusted).increment(1);
}

pub fn record_malformed_peer() {
    counter!("warp_malformed_peer_total").increment(1);
}

/// `source` is an [`IpSource`](crate::security::IpSource) label.
pub fn record_ip_source(source: &'static str) {
    counter!("warp_client_ip_source_total", "source" => source).increment(1);
}

pub fn record_refresh(report: &RefreshReport) {
    gauge!("warp_cidr_ranges", "provider" => "cloudflare").set(report.cloudflare as f64);
    gauge!("warp_cidr_ranges", "provider" => "cloudfront").set(report.cloudfront as f64);
    counter!("warp_cidr_skipped_total").increment(report.skipped as u64);
    counter!("warp_refresh_total").increment(1);
}

pub fn record_fetch_fallback(provider: Provider) {
    counter!("warp_fetch_fallback_total", "provider" => provider.as_str()).increment(1);
}
