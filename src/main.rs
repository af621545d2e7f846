//! Edge-aware reverse proxy.
//!
//! Classifies each connection's transport peer against the published
//! Cloudflare and CloudFront ranges, rewrites the forwarding headers
//! accordingly and forwards the request to a single upstream.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client / Edge            ┌──────────────────────────────────────────────┐
//!     ─────────────────────────┼─▶ http server ─▶ edge_trust ─▶ forwarder ───┼──▶ Upstream
//!                              │                     │                        │
//!                              │                     ▼                        │
//!                              │               CidrRegistry ◀── refresher ◀──┼─── Provider
//!                              │                (ArcSwap)        (timer)      │    range lists
//!                              └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use edge_warp::config::{load_config, ProxyConfig};
use edge_warp::lifecycle::startup;

#[derive(Parser)]
#[command(name = "edge-warp", version, about = "Edge-aware reverse proxy")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => load_config(&path)?,
        None => ProxyConfig::default(),
    };

    startup::run(config).await?;
    Ok(())
}
