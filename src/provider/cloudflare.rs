//! Cloudflare edge network.
//!
//! Published ranges: <https://www.cloudflare.com/ips/>

use axum::http::HeaderName;

/// Client IP as seen by Cloudflare's edge.
pub const CF_CONNECTING_IP: HeaderName = HeaderName::from_static("cf-connecting-ip");

/// JSON blob describing the scheme the visitor used, e.g. `{"scheme":"https"}`.
pub const CF_VISITOR: HeaderName = HeaderName::from_static("cf-visitor");

/// Plain-text range lists, one CIDR per line.
pub const DEFAULT_URLS: [&str; 2] = [
    "https://www.cloudflare.com/ips-v4",
    "https://www.cloudflare.com/ips-v6",
];

/// Snapshot of the published ranges, used when fetching fails.
pub const FALLBACK_RANGES: &[&str] = &[
    "173.245.48.0/20",
    "103.21.244.0/22",
    "103.22.200.0/22",
    "103.31.4.0/22",
    "141.101.64.0/18",
    "108.162.192.0/18",
    "190.93.240.0/20",
    "188.114.96.0/20",
    "197.234.240.0/22",
    "198.41.128.0/17",
    "162.158.0.0/15",
    "104.16.0.0/13",
    "104.24.0.0/14",
    "172.64.0.0/13",
    "131.0.72.0/22",
    "2400:cb00::/32",
    "2606:4700::/32",
    "2803:f800::/32",
    "2405:b500::/32",
    "2405:8100::/32",
    "2a06:98c0::/29",
    "2c0f:f248::/32",
];

/// Split a plain-text range list into entries.
///
/// Validation is left to the registry build, which skips bad lines one by one.
pub fn parse_range_list(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range_list() {
        let body = "173.245.48.0/20\n\n  103.21.244.0/22  \r\n2400:cb00::/32\n";
        assert_eq!(
            parse_range_list(body),
            vec!["173.245.48.0/20", "103.21.244.0/22", "2400:cb00::/32"]
        );
        assert!(parse_range_list("\n \n").is_empty());
    }

    #[test]
    fn test_fallback_ranges_parse() {
        for cidr in FALLBACK_RANGES {
            assert!(cidr.parse::<ipnetwork::IpNetwork>().is_ok(), "{cidr}");
        }
    }
}
