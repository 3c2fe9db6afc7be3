//! Header filtering for proxied requests and responses.
//!
//! Hop-by-hop headers describe one TCP connection, not the message, so a
//! proxy must not relay them (RFC 9110 §7.6.1). Both directions are
//! filtered: request headers before forwarding to the origin, response
//! headers before storing or relaying to the client.

use reqwest::header::HeaderMap;

/// Headers scoped to a single connection.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Whether a header is hop-by-hop and must not be relayed.
pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| name.eq_ignore_ascii_case(h))
}

/// Filter request headers for forwarding to the origin.
///
/// Strips hop-by-hop headers plus `host` and `content-length`, which the
/// HTTP client derives itself from the target URL and the body.
pub fn forward_headers(headers: &[(String, String)]) -> Vec<(String, String)> {
    headers
        .iter()
        .filter(|(name, _)| {
            !is_hop_by_hop(name) && !name.eq_ignore_ascii_case("host") && !name.eq_ignore_ascii_case("content-length")
        })
        .cloned()
        .collect()
}

/// Convert response headers into relayable name/value pairs.
///
/// Strips hop-by-hop headers and `content-length` (the body may have been
/// transparently decompressed, so the original length no longer applies).
/// Values that are not valid UTF-8 are dropped.
pub fn relay_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name.as_str()) && name.as_str() != "content-length")
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_hop_by_hop_case_insensitive() {
        assert!(is_hop_by_hop("Connection"));
        assert!(is_hop_by_hop("TRANSFER-ENCODING"));
        assert!(!is_hop_by_hop("content-type"));
    }

    #[test]
    fn test_forward_headers_strips_connection_scoped() {
        let headers = vec![
            ("accept".to_string(), "text/html".to_string()),
            ("Connection".to_string(), "keep-alive".to_string()),
            ("Host".to_string(), "localhost:8080".to_string()),
            ("content-length".to_string(), "0".to_string()),
            ("sec-fetch-mode".to_string(), "navigate".to_string()),
        ];

        let forwarded = forward_headers(&headers);
        let names: Vec<&str> = forwarded.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["accept", "sec-fetch-mode"]);
    }

    #[test]
    fn test_relay_headers_strips_hop_by_hop_and_length() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "image/png".parse().unwrap());
        headers.insert("content-length", "512".parse().unwrap());
        headers.insert("keep-alive", "timeout=5".parse().unwrap());
        headers.insert("etag", "\"abc\"".parse().unwrap());

        let mut relayed = relay_headers(&headers);
        relayed.sort();
        assert_eq!(
            relayed,
            vec![
                ("content-type".to_string(), "image/png".to_string()),
                ("etag".to_string(), "\"abc\"".to_string()),
            ]
        );
    }
}
