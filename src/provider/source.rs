//! Data sources for provider CIDR lists.
//!
//! # Responsibilities
//! - Fetch the published ranges of each edge network
//! - Substitute the built-in snapshot whenever a fetch yields nothing
//!
//! # Design Decisions
//! - Sources never return errors: a failed fetch is logged and replaced by
//!   fallback data so the registry is never empty for a bucket in use
//! - No parsing into networks here; the registry build owns validation

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use ipnetwork::IpNetwork;

use crate::config::SourcesConfig;
use crate::observability::metrics;
use crate::provider::{cloudflare, cloudfront, Provider};

/// Supplier of raw CIDR strings for a provider bucket.
pub trait CidrSource: Send + Sync + 'static {
    /// Return the current ranges for `provider`.
    ///
    /// Must return the built-in fallback instead of an empty list for
    /// Cloudflare and CloudFront.
    fn fetch(&self, provider: Provider) -> impl Future<Output = Vec<String>> + Send;
}

/// Built-in ranges for a bucket.
pub fn fallback_ranges(provider: Provider) -> Vec<String> {
    let ranges: &[&str] = match provider {
        Provider::Cloudflare => cloudflare::FALLBACK_RANGES,
        Provider::CloudFront => cloudfront::FALLBACK_RANGES,
        Provider::Auto | Provider::Unknown => &[],
    };
    ranges.iter().map(|s| s.to_string()).collect()
}

/// Keep `fetched` if at least one entry is a usable CIDR, else the built-in list.
///
/// A list with nothing parseable (an HTML error page served with 200, say)
/// counts as a failed fetch.
pub fn or_fallback(provider: Provider, fetched: Vec<String>) -> Vec<String> {
    if fetched.iter().any(|cidr| cidr.trim().parse::<IpNetwork>().is_ok()) {
        return fetched;
    }

    tracing::warn!(
        provider = %provider,
        entries = fetched.len(),
        "No usable ranges fetched, using built-in fallback list"
    );
    metrics::record_fetch_fallback(provider);
    fallback_ranges(provider)
}

/// Fetches ranges from the providers' public endpoints.
#[derive(Debug, Clone)]
pub struct HttpCidrSource {
    client: reqwest::Client,
    cloudflare_urls: Vec<String>,
    cloudfront_url: String,
}

impl HttpCidrSource {
    /// Build a source from the `[warp.sources]` configuration.
    pub fn new(config: &SourcesConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("edge-warp/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            cloudflare_urls: config.cloudflare_urls.clone(),
            cloudfront_url: config.cloudfront_url.clone(),
        })
    }

    async fn fetch_cloudflare(&self) -> Vec<String> {
        let mut ranges = Vec::new();

        // A failing URL (say, the v6 list) must not discard the other one.
        for url in &self.cloudflare_urls {
            match self.get_text(url).await {
                Ok(body) => ranges.extend(cloudflare::parse_range_list(&body)),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Failed to fetch Cloudflare ranges");
                }
            }
        }

        ranges
    }

    async fn fetch_cloudfront(&self) -> Vec<String> {
        let doc = match self.get_json(&self.cloudfront_url).await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(url = %self.cloudfront_url, error = %e, "Failed to fetch CloudFront ranges");
                return Vec::new();
            }
        };

        match cloudfront::parse_range_document(&doc) {
            Some(ranges) => ranges,
            None => {
                tracing::warn!(url = %self.cloudfront_url, "CloudFront range document has no edge lists");
                Vec::new()
            }
        }
    }

    async fn get_text(&self, url: &str) -> Result<String, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }

    async fn get_json(&self, url: &str) -> Result<HashMap<String, Vec<String>>, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

impl CidrSource for HttpCidrSource {
    fn fetch(&self, provider: Provider) -> impl Future<Output = Vec<String>> + Send {
        async move {
            tracing::debug!(provider = %provider, "Fetching provider ranges");
            let fetched = match provider {
                Provider::Cloudflare => self.fetch_cloudflare().await,
                Provider::CloudFront => self.fetch_cloudfront().await,
                Provider::Auto | Provider::Unknown => return Vec::new(),
            };
            or_fallback(provider, fetched)
        }
    }
}

/// Fixed range lists, for offline use and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCidrSource {
    ranges: HashMap<Provider, Vec<String>>,
}

impl StaticCidrSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the list returned for `provider`.
    pub fn with(mut self, provider: Provider, ranges: &[&str]) -> Self {
        self.ranges
            .insert(provider, ranges.iter().map(|s| s.to_string()).collect());
        self
    }
}

impl CidrSource for StaticCidrSource {
    fn fetch(&self, provider: Provider) -> impl Future<Output = Vec<String>> + Send {
        let fetched = self.ranges.get(&provider).cloned().unwrap_or_default();
        async move {
            match provider {
                Provider::Cloudflare | Provider::CloudFront => or_fallback(provider, fetched),
                Provider::Auto | Provider::Unknown => Vec::new(),
            }
        }
    }
}
