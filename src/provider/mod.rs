//! Edge provider identities.
//!
//! # Data Flow
//! ```text
//! config string ("cloudflare" | "cloudfront" | "auto")
//!     → Provider::from_str (validated once, at construction)
//!     → participating() buckets   → trust::classifier
//!     → select_ip_header()        → security::headers
//!     → source.rs fetches ranges  → trust::refresh
//! ```
//!
//! # Design Decisions
//! - `Auto` is not a network identity: it is the union of both buckets
//! - Bucket order is the tie-break order (Cloudflare before CloudFront)
//! - In `Auto` the client IP header follows the bucket that matched the peer

use std::fmt;
use std::str::FromStr;

use axum::http::HeaderName;
use serde::Serialize;
use thiserror::Error;

pub mod cloudflare;
pub mod cloudfront;
pub mod source;

pub use source::{CidrSource, HttpCidrSource, StaticCidrSource};

/// The edge network a request may have arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Cloudflare,
    CloudFront,
    /// Trust either bucket.
    Auto,
    Unknown,
}

/// Buckets that hold CIDR ranges in the registry.
pub const EDGE_PROVIDERS: [Provider; 2] = [Provider::Cloudflare, Provider::CloudFront];

/// Error returned when a configured provider string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("no provider has been defined")]
    Empty,

    #[error("unknown provider {0:?} (expected cloudflare, cloudfront or auto)")]
    Unrecognized(String),
}

impl Provider {
    /// Lowercase identifier used in configuration and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Cloudflare => "cloudflare",
            Provider::CloudFront => "cloudfront",
            Provider::Auto => "auto",
            Provider::Unknown => "unknown",
        }
    }

    /// Value written to the matched-provider marker header.
    ///
    /// Only the two real edge networks have a marker of their own.
    pub fn marker(&self) -> &'static str {
        match self {
            Provider::Cloudflare => "cloudflare",
            Provider::CloudFront => "cloudfront",
            Provider::Auto | Provider::Unknown => "unknown",
        }
    }

    /// Header carrying the client IP for a single-provider mode.
    pub fn client_ip_header(&self) -> Option<HeaderName> {
        match self {
            Provider::Cloudflare => Some(cloudflare::CF_CONNECTING_IP),
            Provider::CloudFront => Some(cloudfront::CLOUDFRONT_VIEWER_ADDRESS),
            Provider::Auto | Provider::Unknown => None,
        }
    }

    /// Buckets that count toward the trust union, in tie-break order.
    pub fn participating(&self) -> &'static [Provider] {
        match self {
            Provider::Cloudflare => &[Provider::Cloudflare],
            Provider::CloudFront => &[Provider::CloudFront],
            Provider::Auto => &EDGE_PROVIDERS,
            Provider::Unknown => &[],
        }
    }

    /// Parse a bucket name from the operator override map.
    ///
    /// Only real edge networks are accepted; `auto` is a mode, not a bucket.
    pub fn from_bucket_name(name: &str) -> Option<Provider> {
        match name.parse() {
            Ok(p @ (Provider::Cloudflare | Provider::CloudFront)) => Some(p),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ProviderError::Empty);
        }

        match s.to_ascii_lowercase().as_str() {
            "cloudflare" => Ok(Provider::Cloudflare),
            "cloudfront" => Ok(Provider::CloudFront),
            "auto" => Ok(Provider::Auto),
            _ => Err(ProviderError::Unrecognized(s.to_string())),
        }
    }
}

/// Decide which provider header may supply the client IP.
///
/// Single-provider modes always use their own header. In `Auto` only the
/// header of the bucket the peer actually matched is eligible, so a client
/// behind one edge cannot forge the other edge's header.
pub fn select_ip_header(mode: Provider, matched: Option<Provider>) -> Option<HeaderName> {
    match mode {
        Provider::Auto => matched.and_then(|m| m.client_ip_header()),
        other => other.client_ip_header(),
    }
}

/// Every provider-native client IP header.
pub fn all_client_ip_headers() -> [HeaderName; 2] {
    [cloudflare::CF_CONNECTING_IP, cloudfront::CLOUDFRONT_VIEWER_ADDRESS]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider() {
        assert_eq!("cloudflare".parse::<Provider>(), Ok(Provider::Cloudflare));
        assert_eq!(" CloudFront ".parse::<Provider>(), Ok(Provider::CloudFront));
        assert_eq!("AUTO".parse::<Provider>(), Ok(Provider::Auto));
        assert_eq!("".parse::<Provider>(), Err(ProviderError::Empty));
        assert_eq!(
            "akamai".parse::<Provider>(),
            Err(ProviderError::Unrecognized("akamai".into()))
        );
        // `unknown` is an internal label, never a configurable mode
        assert!("unknown".parse::<Provider>().is_err());
    }

    #[test]
    fn test_participating_buckets() {
        assert_eq!(Provider::Cloudflare.participating(), &[Provider::Cloudflare]);
        assert_eq!(Provider::CloudFront.participating(), &[Provider::CloudFront]);
        assert_eq!(
            Provider::Auto.participating(),
            &[Provider::Cloudflare, Provider::CloudFront]
        );
        assert!(Provider::Unknown.participating().is_empty());
    }

    #[test]
    fn test_select_ip_header_single_mode() {
        assert_eq!(
            select_ip_header(Provider::Cloudflare, None),
            Some(cloudflare::CF_CONNECTING_IP)
        );
        assert_eq!(
            select_ip_header(Provider::CloudFront, Some(Provider::CloudFront)),
            Some(cloudfront::CLOUDFRONT_VIEWER_ADDRESS)
        );
    }

    #[test]
    fn test_select_ip_header_auto_follows_match() {
        assert_eq!(
            select_ip_header(Provider::Auto, Some(Provider::CloudFront)),
            Some(cloudfront::CLOUDFRONT_VIEWER_ADDRESS)
        );
        assert_eq!(
            select_ip_header(Provider::Auto, Some(Provider::Cloudflare)),
            Some(cloudflare::CF_CONNECTING_IP)
        );
        assert_eq!(select_ip_header(Provider::Auto, None), None);
    }

    #[test]
    fn test_bucket_names() {
        assert_eq!(Provider::from_bucket_name("Cloudflare"), Some(Provider::Cloudflare));
        assert_eq!(Provider::from_bucket_name("cloudfront"), Some(Provider::CloudFront));
        assert_eq!(Provider::from_bucket_name("auto"), None);
        assert_eq!(Provider::from_bucket_name("fastly"), None);
    }

    #[test]
    fn test_markers() {
        assert_eq!(Provider::Cloudflare.marker(), "cloudflare");
        assert_eq!(Provider::CloudFront.marker(), "cloudfront");
        assert_eq!(Provider::Auto.marker(), "unknown");
    }
}
