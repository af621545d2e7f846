//! Periodic allowlist refresh.
//!
//! # State Machine
//! ```text
//! Idle (timer) → Fetching → Merging → Swapping → Idle
//!      ↑                                          │
//!      └──────────────────────────────────────────┘
//! shutdown signal observed while Idle → exit
//! ```
//!
//! # Design Decisions
//! - Fetching and parsing happen without touching the registry; only the final
//!   swap publishes the new mapping
//! - Operator overrides are re-applied on every build
//! - The first wait carries random jitter so a fleet does not refresh in lockstep

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::broadcast;

use crate::observability::metrics;
use crate::provider::{source, CidrSource, Provider};
use crate::trust::registry::{CidrRegistry, RangeSet};

/// Upper bound (exclusive) of the start-up jitter, in seconds.
const MAX_JITTER_SECS: u64 = 7;

/// Operator-supplied extra ranges per bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    ranges: HashMap<Provider, Vec<String>>,
}

impl Overrides {
    /// Resolve the `trust_ip` table from configuration.
    ///
    /// Keys that do not name an edge bucket are reported and ignored.
    pub fn from_config(raw: &BTreeMap<String, Vec<String>>) -> Self {
        let mut ranges: HashMap<Provider, Vec<String>> = HashMap::new();
        for (name, list) in raw {
            match Provider::from_bucket_name(name) {
                Some(provider) => ranges.entry(provider).or_default().extend(list.iter().cloned()),
                None => tracing::warn!(key = %name, "Ignoring trust_ip entry for unknown provider"),
            }
        }
        Self { ranges }
    }

    pub fn get(&self, provider: Provider) -> &[String] {
        self.ranges.get(&provider).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Summary of one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    pub cloudflare: usize,
    pub cloudfront: usize,
    pub skipped: usize,
}

impl RefreshReport {
    /// Ranges across both edge buckets.
    pub fn total(&self) -> usize {
        self.cloudflare + self.cloudfront
    }
}

/// Background task that keeps the registry current.
pub struct AllowlistRefresher<S> {
    registry: Arc<CidrRegistry>,
    source: Arc<S>,
    mode: Provider,
    overrides: Overrides,
    interval: Duration,
}

impl<S: CidrSource> AllowlistRefresher<S> {
    pub fn new(
        registry: Arc<CidrRegistry>,
        source: Arc<S>,
        mode: Provider,
        overrides: Overrides,
        interval: Duration,
    ) -> Self {
        Self {
            registry,
            source,
            mode,
            overrides,
            interval,
        }
    }

    /// Fetch, merge, parse and publish a fresh mapping.
    pub async fn refresh_once(&self) -> RefreshReport {
        let (cloudflare, cloudfront) = tokio::join!(
            self.fetch_if_active(Provider::Cloudflare),
            self.fetch_if_active(Provider::CloudFront),
        );

        let fetched = [(Provider::Cloudflare, cloudflare), (Provider::CloudFront, cloudfront)];
        let set = RangeSet::build(fetched.iter().flat_map(|(provider, defaults)| {
            defaults
                .iter()
                .chain(self.overrides.get(*provider))
                .map(move |cidr| (*provider, cidr.as_str()))
        }));

        let report = RefreshReport {
            cloudflare: set.len(Provider::Cloudflare),
            cloudfront: set.len(Provider::CloudFront),
            skipped: set.skipped(),
        };

        self.registry.replace(set);
        metrics::record_refresh(&report);
        report
    }

    /// Defaults are only fetched for buckets the mode actually consults.
    ///
    /// A fetch with no usable range never empties a participating bucket.
    async fn fetch_if_active(&self, provider: Provider) -> Vec<String> {
        if self.mode.participating().contains(&provider) {
            source::or_fallback(provider, self.source.fetch(provider).await)
        } else {
            Vec::new()
        }
    }

    /// Refresh every `interval` until shutdown is signalled.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let jitter = Duration::from_secs(rand::thread_rng().gen_range(0..MAX_JITTER_SECS));
        let mut wait = self.interval + jitter;

        tracing::info!(
            mode = %self.mode,
            interval = ?self.interval,
            first_refresh_in = ?wait,
            "Allowlist refresher starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    let report = self.refresh_once().await;
                    tracing::info!(
                        cloudflare = report.cloudflare,
                        cloudfront = report.cloudfront,
                        skipped = report.skipped,
                        "Refreshed edge CIDRs"
                    );
                    wait = self.interval;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Allowlist refresher received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
