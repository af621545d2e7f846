//! Forwarding header rewrite.
//!
//! # Responsibilities
//! - Strip every inbound forwarding header before writing our own
//! - Set X-Forwarded-For, X-Real-IP, X-Forwarded-Proto and the trust markers
//! - Read provider headers only when the peer is a trusted edge
//!
//! # Design Decisions
//! - Inbound X-Forwarded-* are never trusted, even from a trusted edge: the
//!   edge is trusted, not what the client wrote
//! - Only the header of the bucket that matched may supply the IP; every other
//!   provider's client IP header is dropped, whatever the mode
//! - A bad CF-Visitor never fails the request

use std::net::IpAddr;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;

use crate::provider::{self, cloudflare, cloudfront, Provider};
use crate::trust::{extract_client_ip, TrustResult};

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Trust marker, `yes` or `no`.
pub const X_WARP_TRUSTED: HeaderName = HeaderName::from_static("x-warp-trusted");
/// Matched bucket, `cloudflare`, `cloudfront` or `unknown`.
pub const X_WARP_PROVIDER: HeaderName = HeaderName::from_static("x-warp-provider");

/// Where the forwarded client IP came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpSource {
    /// A provider header of the matched edge.
    ProviderHeader(HeaderName),
    /// The transport peer itself.
    Peer,
}

impl IpSource {
    /// Fixed metric and log label.
    pub fn label(&self) -> &'static str {
        match self {
            IpSource::ProviderHeader(name) if *name == cloudflare::CF_CONNECTING_IP => "cf-connecting-ip",
            IpSource::ProviderHeader(name) if *name == cloudfront::CLOUDFRONT_VIEWER_ADDRESS => {
                "cloudfront-viewer-address"
            }
            IpSource::ProviderHeader(_) => "header",
            IpSource::Peer => "peer",
        }
    }
}

/// What was written for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forwarded {
    pub client_ip: IpAddr,
    pub proto: &'static str,
    pub source: IpSource,
}

#[derive(Debug, Deserialize)]
struct CfVisitor {
    #[serde(default)]
    scheme: String,
}

/// Rewrite `headers` for a classified request.
pub fn rewrite(headers: &mut HeaderMap, trust: &TrustResult, mode: Provider, tls: bool) -> Forwarded {
    strip_inbound_forwarding(headers);

    if trust.trusted {
        rewrite_trusted(headers, trust, mode, tls)
    } else {
        rewrite_untrusted(headers, trust, tls)
    }
}

fn rewrite_trusted(headers: &mut HeaderMap, trust: &TrustResult, mode: Provider, tls: bool) -> Forwarded {
    let matched = trust.matched.unwrap_or(Provider::Unknown);
    headers.insert(X_WARP_TRUSTED, HeaderValue::from_static("yes"));
    headers.insert(X_WARP_PROVIDER, HeaderValue::from_static(matched.marker()));

    let mut proto = None;
    if let Some(visitor) = headers.remove(cloudflare::CF_VISITOR) {
        if matched == Provider::Cloudflare {
            proto = visitor_scheme(&visitor);
        }
    }

    let selected = provider::select_ip_header(mode, trust.matched);

    // Any header but the selected one is dropped unread.
    for name in provider::all_client_ip_headers() {
        if selected.as_ref() != Some(&name) {
            headers.remove(name);
        }
    }

    let from_header = selected.and_then(|name| {
        headers
            .get(&name)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_client_ip)
            .map(|ip| (ip, name))
    });

    let (client_ip, source) = match from_header {
        Some((ip, name)) => (ip, IpSource::ProviderHeader(name)),
        None => (trust.peer_ip, IpSource::Peer),
    };

    let proto = proto.unwrap_or_else(|| fallback_proto(tls));
    finish(headers, client_ip, proto);

    Forwarded {
        client_ip,
        proto,
        source,
    }
}

fn rewrite_untrusted(headers: &mut HeaderMap, trust: &TrustResult, tls: bool) -> Forwarded {
    headers.remove(cloudflare::CF_VISITOR);
    for name in provider::all_client_ip_headers() {
        headers.remove(name);
    }

    headers.insert(X_WARP_TRUSTED, HeaderValue::from_static("no"));
    headers.insert(X_WARP_PROVIDER, HeaderValue::from_static(Provider::Unknown.marker()));

    let proto = fallback_proto(tls);
    finish(headers, trust.peer_ip, proto);

    Forwarded {
        client_ip: trust.peer_ip,
        proto,
        source: IpSource::Peer,
    }
}

/// Remove every forwarding header a client could have set.
pub fn strip_inbound_forwarding(headers: &mut HeaderMap) {
    for name in [
        X_FORWARDED_FOR,
        X_REAL_IP,
        X_FORWARDED_PROTO,
        header::FORWARDED,
        X_WARP_TRUSTED,
        X_WARP_PROVIDER,
    ] {
        headers.remove(name);
    }
}

fn finish(headers: &mut HeaderMap, client_ip: IpAddr, proto: &'static str) {
    headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static(proto));
    append_forwarded_for(headers, client_ip);
    headers.insert(X_REAL_IP, ip_value(client_ip));
}

/// Append `ip` to X-Forwarded-For, keeping any value already present.
fn append_forwarded_for(headers: &mut HeaderMap, ip: IpAddr) {
    let prior = headers
        .get(&X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string);

    let value = match prior {
        Some(prior) => HeaderValue::from_str(&format!("{prior}, {ip}")).unwrap_or_else(|_| ip_value(ip)),
        None => ip_value(ip),
    };
    headers.insert(X_FORWARDED_FOR, value);
}

fn ip_value(ip: IpAddr) -> HeaderValue {
    // IP literals are always visible ASCII.
    HeaderValue::from_str(&ip.to_string()).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Scheme announced by CF-Visitor, if it is a usable one.
fn visitor_scheme(value: &HeaderValue) -> Option<&'static str> {
    let raw = value.to_str().ok()?;
    let visitor: CfVisitor = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring malformed CF-Visitor header");
            return None;
        }
    };

    match visitor.scheme.trim().to_ascii_lowercase().as_str() {
        "http" => Some("http"),
        "https" => Some("https"),
        _ => None,
    }
}

fn fallback_proto(tls: bool) -> &'static str {
    if tls {
        "https"
    } else {
        "http"
    }
}
