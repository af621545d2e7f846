//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize logging and metrics from the validated configuration
//! - Build the edge trust filter (initial CIDR fetch) before accepting traffic
//! - Bind the listener and serve until a signal arrives
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ProxyConfig;
use crate::http::{HttpServer, ServerError};
use crate::lifecycle::{signals, Shutdown};
use crate::net::tls;
use crate::observability::{logging, metrics};
use crate::provider::HttpCidrSource;
use crate::security::{EdgeTrust, WarpError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Warp(#[from] WarpError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("invalid bind address {0:?}")]
    BindAddress(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the proxy until SIGINT/SIGTERM.
pub async fn run(config: ProxyConfig) -> Result<(), StartupError> {
    logging::init_logging(&config.observability);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        provider = %config.warp.provider,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();

    let source = Arc::new(HttpCidrSource::new(&config.warp.sources).map_err(WarpError::from)?);
    let filter = EdgeTrust::start(config.warp.name.clone(), &config.warp, source, &shutdown).await?;

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        tracing::info!("Shutdown signal received");
        signal_shutdown.trigger();
    });

    let tls_config = config.listener.tls.clone();
    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config, filter)?;

    match tls_config {
        Some(tls_settings) => {
            let addr: SocketAddr = bind_address
                .parse()
                .map_err(|_| StartupError::BindAddress(bind_address.clone()))?;
            let rustls = tls::from_config(&tls_settings).await?;
            server.run_tls(addr, rustls, shutdown).await?;
        }
        None => {
            let listener = TcpListener::bind(&bind_address).await?;
            server.run(listener, shutdown).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
