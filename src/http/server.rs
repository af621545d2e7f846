//! HTTP server setup and upstream forwarding.
//!
//! # Responsibilities
//! - Create Axum Router with the forwarding handler
//! - Wire up middleware (tracing, timeout, TLS flag, edge trust)
//! - Serve plain HTTP or HTTPS with graceful shutdown
//! - Forward rewritten requests to the single upstream

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        StatusCode, Uri, Version,
    },
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Extension, Router,
};
use axum_server::tls_rustls::RustlsConfig;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ProxyConfig;
use crate::lifecycle::Shutdown;
use crate::security::{edge_trust_middleware, ConnectionTls, EdgeTrust, Forwarded};

/// Time in-flight requests get to finish once shutdown starts (TLS listener).
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid upstream address {address:?}: {source}")]
    Upstream {
        address: String,
        source: axum::http::uri::InvalidUri,
    },
}

/// Application state injected into the forwarder.
#[derive(Clone)]
pub struct AppState {
    pub client: Client<HttpConnector, Body>,
    pub upstream: Authority,
}

/// HTTP server for the edge-aware proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server in front of `filter`.
    pub fn new(config: ProxyConfig, filter: Arc<EdgeTrust>) -> Result<Self, ServerError> {
        let upstream: Authority =
            config
                .upstream
                .address
                .parse()
                .map_err(|source| ServerError::Upstream {
                    address: config.upstream.address.clone(),
                    source,
                })?;

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let state = AppState { client, upstream };

        let router = Self::build_router(&config, state, filter);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState, filter: Arc<EdgeTrust>) -> Router {
        let tls = ConnectionTls(config.listener.tls.is_some());

        Router::new()
            .route("/{*path}", any(forward))
            .route("/", any(forward))
            .with_state(state)
            .layer(middleware::from_fn_with_state(filter, edge_trust_middleware))
            .layer(Extension(tls))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router, for embedding or in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Serve plain HTTP on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, upstream = %self.config.upstream.address, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        shutdown: Shutdown,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, upstream = %self.config.upstream.address, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        let stop = shutdown.wait();
        tokio::spawn(async move {
            stop.await;
            drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service_with_connect_info::<SocketAddr>())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Send the (already rewritten) request to the upstream.
async fn forward(State(state): State<AppState>, request: Request) -> Response {
    let (mut parts, body) = request.into_parts();

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(state.upstream.clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build upstream URI");
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };
    // The upstream client speaks HTTP/1.1 regardless of the inbound protocol.
    parts.version = Version::HTTP_11;

    if let Some(forwarded) = parts.extensions.get::<Forwarded>() {
        tracing::debug!(
            method = %parts.method,
            uri = %parts.uri,
            client_ip = %forwarded.client_ip,
            "Forwarding request"
        );
    }

    let upstream_response: Result<hyper::Response<hyper::body::Incoming>, _> =
        state.client.request(Request::from_parts(parts, body)).await;

    match upstream_response {
        Ok(response) => {
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(upstream = %state.upstream, error = %e, "Upstream error");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
