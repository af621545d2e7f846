//! Edge trust filter: classification plus header rewrite for one request.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::config::{refresh_interval_or_default, WarpConfig};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::provider::{CidrSource, Provider, ProviderError};
use crate::security::headers::{self, Forwarded};
use crate::trust::{classify, AllowlistRefresher, CidrRegistry, Overrides, TrustError};

/// Filter construction failure.
#[derive(Debug, Error)]
pub enum WarpError {
    #[error("invalid provider: {0}")]
    Provider(#[from] ProviderError),

    #[error("failed to build range fetcher: {0}")]
    Source(#[from] reqwest::Error),
}

/// Whether the connection a request arrived on was TLS-terminated here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionTls(pub bool);

/// One configured filter instance.
#[derive(Debug)]
pub struct EdgeTrust {
    name: String,
    mode: Provider,
    registry: Arc<CidrRegistry>,
    debug: bool,
}

impl EdgeTrust {
    /// Wrap an externally managed registry.
    pub fn new(name: impl Into<String>, mode: Provider, registry: Arc<CidrRegistry>, debug: bool) -> Self {
        Self {
            name: name.into(),
            mode,
            registry,
            debug,
        }
    }

    /// Build the filter from configuration.
    ///
    /// The first registry build completes before this returns. When
    /// `auto_refresh` is on, a refresher task is spawned that stops on
    /// `shutdown`.
    pub async fn start<S: CidrSource>(
        name: impl Into<String>,
        config: &WarpConfig,
        source: Arc<S>,
        shutdown: &Shutdown,
    ) -> Result<Arc<Self>, WarpError> {
        let name = name.into();
        let mode: Provider = config.provider.parse()?;
        let overrides = Overrides::from_config(&config.trust_ip);
        let interval = refresh_interval_or_default(&config.refresh_interval);
        let registry = Arc::new(CidrRegistry::new());

        let refresher = AllowlistRefresher::new(registry.clone(), source, mode, overrides, interval);
        let report = refresher.refresh_once().await;

        tracing::info!(
            filter = %name,
            mode = %mode,
            cloudflare = report.cloudflare,
            cloudfront = report.cloudfront,
            skipped = report.skipped,
            auto_refresh = config.auto_refresh,
            "Edge trust filter ready"
        );

        if config.auto_refresh {
            tokio::spawn(refresher.run(shutdown.subscribe()));
        }

        Ok(Arc::new(Self::new(name, mode, registry, config.debug)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> Provider {
        self.mode
    }

    pub fn registry(&self) -> &Arc<CidrRegistry> {
        &self.registry
    }

    /// Classify `peer` and rewrite the forwarding headers in place.
    ///
    /// On error the headers are left untouched.
    pub fn process(&self, peer: &str, headers: &mut HeaderMap, tls: bool) -> Result<Forwarded, TrustError> {
        let snapshot = self.registry.snapshot();
        let trust = match classify(peer, self.mode, &snapshot) {
            Ok(t) => t,
            Err(e) => {
                metrics::record_malformed_peer();
                tracing::warn!(filter = %self.name, peer = %peer, "Rejecting request from malformed peer address");
                return Err(e);
            }
        };

        let forwarded = headers::rewrite(headers, &trust, self.mode, tls);

        metrics::record_trust_decision(trust.matched, trust.trusted);
        metrics::record_ip_source(forwarded.source.label());

        if self.debug {
            tracing::info!(
                filter = %self.name,
                peer = %trust.peer_ip,
                trusted = trust.trusted,
                provider = trust.matched.map(|p| p.marker()).unwrap_or("none"),
                client_ip = %forwarded.client_ip,
                source = forwarded.source.label(),
                proto = forwarded.proto,
                "Edge trust decision"
            );
        } else {
            tracing::debug!(
                filter = %self.name,
                peer = %trust.peer_ip,
                trusted = trust.trusted,
                client_ip = %forwarded.client_ip,
                "Edge trust decision"
            );
        }

        Ok(forwarded)
    }
}

impl IntoResponse for TrustError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, "Unknown source").into_response()
    }
}

/// Axum middleware running the filter before the next stage.
///
/// The decision is attached to the request as a [`Forwarded`] extension.
pub async fn edge_trust_middleware(
    State(filter): State<Arc<EdgeTrust>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    mut req: Request,
    next: Next,
) -> Response {
    let tls = req
        .extensions()
        .get::<ConnectionTls>()
        .copied()
        .unwrap_or_default()
        .0;

    match filter.process(&peer.to_string(), req.headers_mut(), tls) {
        Ok(forwarded) => {
            req.extensions_mut().insert(forwarded);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}
