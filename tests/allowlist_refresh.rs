//! Fetching provider ranges over HTTP and publishing them to the registry.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use edge_warp::config::{SourcesConfig, WarpConfig};
use edge_warp::provider::{cloudflare, cloudfront, CidrSource, HttpCidrSource, Provider};
use edge_warp::security::EdgeTrust;
use edge_warp::trust::{AllowlistRefresher, CidrRegistry, Overrides};
use edge_warp::Shutdown;

use common::MockResponse;

mod common;

const CLOUDFRONT_DOC: &str = r#"{
    "CLOUDFRONT_GLOBAL_IP_LIST": ["120.52.22.96/27", "205.251.249.0/24"],
    "CLOUDFRONT_REGIONAL_EDGE_IP_LIST": ["13.113.196.64/26"]
}"#;

async fn provider_backend() -> std::net::SocketAddr {
    common::start_programmable_backend(|request| async move {
        match request.path.as_str() {
            "/ips-v4" => MockResponse::text("198.51.100.0/24\n192.0.2.0/24\n"),
            "/ips-v6" => MockResponse::text("2001:db8::/32\n"),
            "/cloudfront" => MockResponse::json(CLOUDFRONT_DOC),
            _ => MockResponse::status(404),
        }
    })
    .await
}

fn sources(base: std::net::SocketAddr, cloudflare_paths: &[&str], cloudfront_path: &str) -> SourcesConfig {
    SourcesConfig {
        cloudflare_urls: cloudflare_paths
            .iter()
            .map(|p| format!("http://{base}{p}"))
            .collect(),
        cloudfront_url: format!("http://{base}{cloudfront_path}"),
        timeout_secs: 5,
    }
}

#[tokio::test]
async fn test_http_source_reads_both_providers() {
    let base = provider_backend().await;
    let source = HttpCidrSource::new(&sources(base, &["/ips-v4", "/ips-v6"], "/cloudfront")).unwrap();

    assert_eq!(
        source.fetch(Provider::Cloudflare).await,
        vec!["198.51.100.0/24", "192.0.2.0/24", "2001:db8::/32"]
    );

    let mut cloudfront_ranges = source.fetch(Provider::CloudFront).await;
    cloudfront_ranges.sort();
    assert_eq!(
        cloudfront_ranges,
        vec!["120.52.22.96/27", "13.113.196.64/26", "205.251.249.0/24"]
    );
}

#[tokio::test]
async fn test_one_failing_cloudflare_url_keeps_the_other() {
    let base = provider_backend().await;
    let source = HttpCidrSource::new(&sources(base, &["/ips-v4", "/missing"], "/cloudfront")).unwrap();

    assert_eq!(
        source.fetch(Provider::Cloudflare).await,
        vec!["198.51.100.0/24", "192.0.2.0/24"]
    );
}

#[tokio::test]
async fn test_http_errors_fall_back_to_builtin_lists() {
    let base = provider_backend().await;
    let source = HttpCidrSource::new(&sources(base, &["/missing"], "/missing")).unwrap();

    assert_eq!(
        source.fetch(Provider::Cloudflare).await.len(),
        cloudflare::FALLBACK_RANGES.len()
    );
    assert_eq!(
        source.fetch(Provider::CloudFront).await.len(),
        cloudfront::FALLBACK_RANGES.len()
    );
}

#[tokio::test]
async fn test_document_without_edge_lists_falls_back() {
    let base = common::start_programmable_backend(|_| async { MockResponse::json(r#"{"OTHER":[]}"#) }).await;
    let source = HttpCidrSource::new(&sources(base, &[], "/cloudfront")).unwrap();

    assert_eq!(
        source.fetch(Provider::CloudFront).await.len(),
        cloudfront::FALLBACK_RANGES.len()
    );
}

#[tokio::test]
async fn test_error_page_with_ok_status_keeps_builtin_ranges() {
    let base =
        common::start_programmable_backend(|_| async { MockResponse::text("<html>maintenance</html>\n") }).await;
    let source = HttpCidrSource::new(&sources(base, &["/ips-v4"], "/cloudfront")).unwrap();
    let registry = Arc::new(CidrRegistry::new());

    let refresher = AllowlistRefresher::new(
        registry.clone(),
        Arc::new(source),
        Provider::Cloudflare,
        Overrides::default(),
        Duration::from_secs(3600),
    );
    let report = refresher.refresh_once().await;

    assert!(report.cloudflare > 0);
    assert_eq!(report.cloudflare, cloudflare::FALLBACK_RANGES.len());
    assert!(registry.contains(Provider::Cloudflare, "173.245.48.1".parse().unwrap()));
}

#[tokio::test]
async fn test_refresh_publishes_fetched_ranges_with_overrides() {
    let base = provider_backend().await;
    let source = HttpCidrSource::new(&sources(base, &["/ips-v4", "/ips-v6"], "/cloudfront")).unwrap();
    let registry = Arc::new(CidrRegistry::new());

    let mut raw = BTreeMap::new();
    raw.insert("cloudfront".to_string(), vec!["10.9.0.0/16".to_string()]);

    let refresher = AllowlistRefresher::new(
        registry.clone(),
        Arc::new(source),
        Provider::Auto,
        Overrides::from_config(&raw),
        Duration::from_secs(3600),
    );
    let report = refresher.refresh_once().await;

    assert_eq!(report.cloudflare, 3);
    assert_eq!(report.cloudfront, 4);
    assert_eq!(report.skipped, 0);
    assert!(registry.contains(Provider::Cloudflare, "2001:db8::7".parse().unwrap()));
    assert!(registry.contains(Provider::CloudFront, "10.9.1.1".parse().unwrap()));
    assert!(!registry.contains(Provider::CloudFront, "198.51.100.1".parse().unwrap()));
}

#[tokio::test]
async fn test_filter_start_fetches_once_when_refresh_disabled() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let base = common::start_programmable_backend(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { MockResponse::text("198.51.100.0/24\n") }
    })
    .await;

    let config = WarpConfig {
        provider: "cloudflare".into(),
        auto_refresh: false,
        sources: sources(base, &["/ips-v4"], "/cloudfront"),
        ..Default::default()
    };
    let source = Arc::new(HttpCidrSource::new(&config.sources).unwrap());
    let shutdown = Shutdown::new();

    let filter = EdgeTrust::start("once", &config, source, &shutdown).await.unwrap();
    assert!(filter
        .registry()
        .contains(Provider::Cloudflare, "198.51.100.50".parse().unwrap()));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(shutdown.receiver_count(), 0);
}
