//! Provider CIDR registry.
//!
//! # Responsibilities
//! - Hold the parsed ranges of each provider bucket
//! - Answer point membership queries
//! - Swap in a freshly built mapping as a whole
//!
//! # Design Decisions
//! - The mapping is an immutable `RangeSet` behind `ArcSwap`: readers do a
//!   pointer load, the writer replaces the pointer, nothing is mutated in place
//! - Bad CIDR entries are skipped one at a time while building

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use ipnetwork::IpNetwork;

use crate::provider::{Provider, EDGE_PROVIDERS};

/// Immutable provider → ranges mapping.
#[derive(Debug, Clone, Default)]
pub struct RangeSet {
    buckets: HashMap<Provider, Vec<IpNetwork>>,
    skipped: usize,
}

impl RangeSet {
    /// Parse `(provider, cidr)` pairs into a new mapping.
    ///
    /// Entries are trimmed; empty and unparsable ones are skipped and counted.
    pub fn build<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Provider, &'a str)>,
    {
        let mut set = RangeSet::default();

        for (provider, raw) in entries {
            let cidr = raw.trim();
            if cidr.is_empty() {
                continue;
            }

            match cidr.parse::<IpNetwork>() {
                Ok(net) => set.buckets.entry(provider).or_default().push(net),
                Err(e) => {
                    tracing::debug!(provider = %provider, cidr = %cidr, error = %e, "Skipping invalid CIDR");
                    set.skipped += 1;
                }
            }
        }

        set
    }

    /// Whether `ip` falls inside any range of `provider`.
    pub fn contains(&self, provider: Provider, ip: IpAddr) -> bool {
        self.buckets
            .get(&provider)
            .map(|nets| nets.iter().any(|net| net.contains(ip)))
            .unwrap_or(false)
    }

    /// Ranges registered for `provider`, in insertion order.
    pub fn ranges(&self, provider: Provider) -> &[IpNetwork] {
        self.buckets.get(&provider).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of ranges in a bucket.
    pub fn len(&self, provider: Provider) -> usize {
        self.ranges(provider).len()
    }

    /// True when no bucket holds any range.
    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }

    /// Entries dropped while building this set.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

/// Shared, atomically replaceable registry.
#[derive(Debug, Default)]
pub struct CidrRegistry {
    current: ArcSwap<RangeSet>,
}

impl CidrRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with `set`.
    pub fn with_ranges(set: RangeSet) -> Self {
        Self {
            current: ArcSwap::from_pointee(set),
        }
    }

    /// Replace the whole mapping in one step.
    pub fn replace(&self, set: RangeSet) {
        self.current.store(Arc::new(set));
    }

    /// The mapping as of now. Later replacements do not affect it.
    pub fn snapshot(&self) -> Arc<RangeSet> {
        self.current.load_full()
    }

    pub fn contains(&self, provider: Provider, ip: IpAddr) -> bool {
        self.current.load().contains(provider, ip)
    }

    /// Range count per edge bucket.
    pub fn counts(&self) -> [(Provider, usize); 2] {
        let set = self.current.load();
        EDGE_PROVIDERS.map(|p| (p, set.len(p)))
    }
}
