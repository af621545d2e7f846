use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};

use edge_warp::config::SourcesConfig;
use edge_warp::provider::{CidrSource, HttpCidrSource, Provider, StaticCidrSource};
use edge_warp::security::headers;
use edge_warp::trust::{classify, AllowlistRefresher, CidrRegistry, Overrides};

#[derive(Parser)]
#[command(name = "warp-cli")]
#[command(about = "Inspect edge provider ranges and trust decisions", long_about = None)]
struct Cli {
    /// Use the built-in range lists instead of fetching
    #[arg(long, global = true)]
    offline: bool,

    /// Fetch timeout in seconds
    #[arg(long, global = true, default_value_t = 10)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the default ranges per provider
    Fetch {
        /// cloudflare, cloudfront or auto
        #[arg(short, long, default_value = "auto")]
        provider: String,
    },
    /// Classify a peer address and show the rewritten headers
    Classify {
        /// Transport peer, e.g. 173.245.48.1:443
        #[arg(long)]
        peer: String,

        /// cloudflare, cloudfront or auto
        #[arg(short, long, default_value = "auto")]
        provider: String,

        /// Extra trusted range, as provider=CIDR (repeatable)
        #[arg(long = "trust", value_name = "PROVIDER=CIDR")]
        trust: Vec<String>,

        /// Inbound request header, as Name:Value (repeatable)
        #[arg(short = 'H', long = "header", value_name = "NAME:VALUE")]
        headers: Vec<String>,

        /// Treat the connection as TLS-terminated
        #[arg(long)]
        tls: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let sources = SourcesConfig {
        timeout_secs: cli.timeout,
        ..Default::default()
    };

    match cli.command {
        Commands::Fetch { provider } => {
            let mode: Provider = provider.parse()?;
            let ranges = if cli.offline {
                fetch_all(&StaticCidrSource::new(), mode).await
            } else {
                fetch_all(&HttpCidrSource::new(&sources)?, mode).await
            };
            println!("{}", serde_json::to_string_pretty(&ranges)?);
        }
        Commands::Classify {
            peer,
            provider,
            trust,
            headers: raw_headers,
            tls,
        } => {
            let mode: Provider = provider.parse()?;
            let overrides = Overrides::from_config(&parse_trust(&trust)?);
            let mut inbound = parse_headers(&raw_headers)?;

            let registry = if cli.offline {
                build_registry(StaticCidrSource::new(), mode, overrides).await
            } else {
                build_registry(HttpCidrSource::new(&sources)?, mode, overrides).await
            };

            let result = classify(&peer, mode, &registry.snapshot())?;
            let forwarded = headers::rewrite(&mut inbound, &result, mode, tls);

            let output = json!({
                "trust": result,
                "client_ip": forwarded.client_ip,
                "source": forwarded.source.label(),
                "headers": header_json(&inbound),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

async fn fetch_all<S: CidrSource>(source: &S, mode: Provider) -> BTreeMap<&'static str, Vec<String>> {
    let mut out = BTreeMap::new();
    for provider in mode.participating() {
        out.insert(provider.as_str(), source.fetch(*provider).await);
    }
    out
}

async fn build_registry<S: CidrSource>(source: S, mode: Provider, overrides: Overrides) -> Arc<CidrRegistry> {
    let registry = Arc::new(CidrRegistry::new());
    // One-shot build; the interval is never used.
    AllowlistRefresher::new(registry.clone(), Arc::new(source), mode, overrides, Duration::ZERO)
        .refresh_once()
        .await;
    registry
}

fn parse_trust(entries: &[String]) -> Result<BTreeMap<String, Vec<String>>, String> {
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for entry in entries {
        let (provider, cidr) = entry
            .split_once('=')
            .ok_or_else(|| format!("expected PROVIDER=CIDR, got {entry:?}"))?;
        out.entry(provider.trim().to_string())
            .or_default()
            .push(cidr.trim().to_string());
    }
    Ok(out)
}

fn parse_headers(entries: &[String]) -> Result<HeaderMap, Box<dyn std::error::Error>> {
    let mut map = HeaderMap::new();
    for entry in entries {
        let (name, value) = entry
            .split_once(':')
            .ok_or_else(|| format!("expected NAME:VALUE, got {entry:?}"))?;
        map.append(
            HeaderName::from_bytes(name.trim().as_bytes())?,
            HeaderValue::from_str(value.trim())?,
        );
    }
    Ok(map)
}

fn header_json(map: &HeaderMap) -> Value {
    let mut out = Map::new();
    for (name, value) in map {
        out.insert(
            name.as_str().to_string(),
            Value::String(value.to_str().unwrap_or("<binary>").to_string()),
        );
    }
    Value::Object(out)
}
