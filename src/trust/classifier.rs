//! Trust classification of the transport peer.
//!
//! # Responsibilities
//! - Parse the peer address handed over by the server
//! - Test it against the buckets of the active provider mode
//! - Report which bucket matched
//!
//! # Design Decisions
//! - Only the socket peer decides trust; request headers are never consulted
//! - All lookups of one request run against a single registry snapshot
//! - First matching bucket wins, Cloudflare is checked before CloudFront

use std::net::IpAddr;

use serde::Serialize;

use crate::provider::Provider;
use crate::trust::extract::peer_host;
use crate::trust::registry::RangeSet;
use crate::trust::TrustError;

/// Outcome of classifying one request's peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrustResult {
    /// Bucket the peer matched, if any.
    pub matched: Option<Provider>,
    /// Parsed transport peer address.
    pub peer_ip: IpAddr,
    /// Whether the peer is a trusted edge.
    pub trusted: bool,
}

impl TrustResult {
    fn untrusted(peer_ip: IpAddr) -> Self {
        Self {
            matched: None,
            peer_ip,
            trusted: false,
        }
    }
}

/// Classify `peer` (a `host:port` or bare host string) under `mode`.
pub fn classify(peer: &str, mode: Provider, ranges: &RangeSet) -> Result<TrustResult, TrustError> {
    let peer_ip = peer_host(peer)
        .parse::<IpAddr>()
        .map_err(|_| TrustError::MalformedPeerAddress(peer.to_string()))?
        // Dual-stack listeners report v4 peers as ::ffff:a.b.c.d.
        .to_canonical();

    let matched = mode
        .participating()
        .iter()
        .copied()
        .find(|bucket| ranges.contains(*bucket, peer_ip));

    Ok(match matched {
        Some(bucket) => TrustResult {
            matched: Some(bucket),
            peer_ip,
            trusted: true,
        },
        None => TrustResult::untrusted(peer_ip),
    })
}
