//! Client IP resolution for rate limiting
//!
//! Proxy headers are consulted before the TCP peer address because the
//! deployed server sits behind a reverse proxy that rewrites the
//! connection source.

use std::net::SocketAddr;

use axum::http::HeaderMap;

/// Proxy headers carrying the originating client IP, in precedence order
const IP_HEADERS: [&str; 3] = ["x-forwarded-for", "x-real-ip", "cf-connecting-ip"];

/// Resolve the client IP used as the rate-limit identifier
///
/// `x-forwarded-for` may carry a comma-separated hop chain; the first
/// entry is the client. Falls back to the TCP peer address, then to
/// `"unknown"` when the connection carries no peer info.
pub(crate) fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    for name in IP_HEADERS {
        if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
            if let Some(first) = value.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return first.to_string();
                }
            }
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_forwarded_for_takes_first_hop() {
        let headers = headers(&[("x-forwarded-for", "203.0.113.7, 10.0.0.1, 10.0.0.2")]);
        assert_eq!(client_ip(&headers, None), "203.0.113.7");
    }

    #[test]
    fn test_header_precedence() {
        let headers = headers(&[
            ("cf-connecting-ip", "198.51.100.3"),
            ("x-real-ip", "198.51.100.2"),
            ("x-forwarded-for", "198.51.100.1"),
        ]);
        assert_eq!(client_ip(&headers, None), "198.51.100.1");
    }

    #[test]
    fn test_real_ip_fallback() {
        let headers = headers(&[("x-real-ip", "198.51.100.9")]);
        assert_eq!(client_ip(&headers, None), "198.51.100.9");
    }

    #[test]
    fn test_empty_header_skipped() {
        let headers = headers(&[
            ("x-forwarded-for", ""),
            ("cf-connecting-ip", "198.51.100.4"),
        ]);
        assert_eq!(client_ip(&headers, None), "198.51.100.4");
    }

    #[test]
    fn test_peer_address_fallback() {
        let peer: SocketAddr = "192.0.2.10:55000".parse().unwrap();
        assert_eq!(client_ip(&HeaderMap::new(), Some(peer)), "192.0.2.10");
    }

    #[test]
    fn test_unknown_without_peer() {
        assert_eq!(client_ip(&HeaderMap::new(), None), "unknown");
    }
}
