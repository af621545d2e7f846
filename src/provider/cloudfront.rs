//! Amazon CloudFront edge network.
//!
//! Published ranges: <https://docs.aws.amazon.com/AmazonCloudFront/latest/DeveloperGuide/LocationsOfEdgeServers.html>

use std::collections::HashMap;

use axum::http::HeaderName;

/// Viewer address forwarded by CloudFront, `ip:port` form.
pub const CLOUDFRONT_VIEWER_ADDRESS: HeaderName =
    HeaderName::from_static("cloudfront-viewer-address");

/// JSON document listing the edge ranges.
pub const DEFAULT_URL: &str = "https://d7uri8nf7uskq.cloudfront.net/tools/list-cloudfront-ips";

const GLOBAL_KEY: &str = "CLOUDFRONT_GLOBAL_IP_LIST";
const REGIONAL_KEY: &str = "CLOUDFRONT_REGIONAL_EDGE_IP_LIST";

/// Snapshot of the published ranges, used when fetching fails.
pub const FALLBACK_RANGES: &[&str] = &[
    "13.32.0.0/15",
    "13.35.0.0/16",
    "13.224.0.0/14",
    "13.249.0.0/16",
    "18.64.0.0/14",
    "18.154.0.0/15",
    "18.160.0.0/15",
    "18.164.0.0/15",
    "18.172.0.0/15",
    "18.238.0.0/15",
    "18.244.0.0/15",
    "52.46.0.0/18",
    "52.84.0.0/15",
    "52.124.128.0/17",
    "52.222.128.0/17",
    "54.182.0.0/16",
    "54.192.0.0/16",
    "54.230.0.0/17",
    "54.230.128.0/18",
    "54.230.200.0/21",
    "54.230.208.0/20",
    "54.230.224.0/19",
    "54.239.128.0/18",
    "54.239.192.0/19",
    "54.240.128.0/18",
    "64.252.64.0/18",
    "64.252.128.0/18",
    "65.8.0.0/16",
    "65.9.0.0/17",
    "65.9.128.0/18",
    "70.132.0.0/18",
    "71.152.0.0/17",
    "99.84.0.0/16",
    "99.86.0.0/16",
    "108.138.0.0/15",
    "108.156.0.0/14",
    "130.176.0.0/17",
    "130.176.128.0/18",
    "130.176.192.0/19",
    "130.176.224.0/20",
    "143.204.0.0/16",
    "144.220.0.0/16",
    "204.246.164.0/22",
    "204.246.168.0/22",
    "204.246.172.0/24",
    "204.246.173.0/24",
    "204.246.174.0/23",
    "204.246.176.0/20",
    "205.251.200.0/21",
    "205.251.208.0/20",
    "205.251.249.0/24",
    "205.251.250.0/23",
    "205.251.252.0/23",
    "205.251.254.0/24",
    "216.137.32.0/19",
];

/// Pull the global and regional edge lists out of the published document.
///
/// Returns `None` when neither list is present so the caller can fall back.
pub fn parse_range_document(doc: &HashMap<String, Vec<String>>) -> Option<Vec<String>> {
    let global = doc.get(GLOBAL_KEY);
    let regional = doc.get(REGIONAL_KEY);
    if global.is_none() && regional.is_none() {
        return None;
    }

    Some(
        global
            .into_iter()
            .chain(regional)
            .flatten()
            .cloned()
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range_document_merges_lists() {
        let doc: HashMap<String, Vec<String>> = serde_json::from_str(
            r#"{
                "CLOUDFRONT_GLOBAL_IP_LIST": ["120.52.22.96/27", "205.251.249.0/24"],
                "CLOUDFRONT_REGIONAL_EDGE_IP_LIST": ["13.113.196.64/26"]
            }"#,
        )
        .unwrap();

        assert_eq!(
            parse_range_document(&doc).unwrap(),
            vec!["120.52.22.96/27", "205.251.249.0/24", "13.113.196.64/26"]
        );
    }

    #[test]
    fn test_parse_range_document_missing_keys() {
        let doc: HashMap<String, Vec<String>> =
            serde_json::from_str(r#"{"SOMETHING_ELSE": ["1.2.3.0/24"]}"#).unwrap();
        assert_eq!(parse_range_document(&doc), None);
    }

    #[test]
    fn test_fallback_ranges_parse() {
        for cidr in FALLBACK_RANGES {
            assert!(cidr.parse::<ipnetwork::IpNetwork>().is_ok(), "{cidr}");
        }
    }
}
