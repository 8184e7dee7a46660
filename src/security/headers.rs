//! Header hygiene for proxied requests.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers before forwarding
//! - Add X-Forwarded-Host / X-Forwarded-For when absent
//! - Copy header maps by value so the inbound and upstream maps never alias
//!
//! # Design Decisions
//! - The deny-list is a fixed constant (RFC 2616 §13.5.1 plus Proxy-Connection)
//! - Existing X-Forwarded-* values are kept, so repeated forwarding is idempotent
//! - Copies preserve header order and per-name value order

use axum::http::{
    header::{self, HeaderName},
    HeaderMap, HeaderValue,
};
use std::net::SocketAddr;

pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Hop-by-hop headers, lowercase. Never forwarded to a backend.
pub const HOP_HEADERS: [&str; 9] = [
    "connection",
    "proxy-connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

pub fn is_hop_header(name: &HeaderName) -> bool {
    HOP_HEADERS.contains(&name.as_str())
}

/// Copy `source` by value without hop-by-hop headers.
///
/// `Host` is dropped too: the upstream client derives it from the upstream URI,
/// and the inbound value travels as X-Forwarded-Host instead.
pub fn forwardable_headers(source: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(source.len());
    for (name, value) in source.iter() {
        if is_hop_header(name) || name == header::HOST {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

/// Set X-Forwarded-Host and X-Forwarded-For unless the client already sent them.
pub fn set_forwarded_headers(
    headers: &mut HeaderMap,
    host: Option<&str>,
    remote_addr: Option<SocketAddr>,
) {
    if let Some(host) = host.filter(|h| !h.is_empty()) {
        if is_unset(headers, &X_FORWARDED_HOST) {
            if let Ok(value) = HeaderValue::from_str(host) {
                headers.insert(X_FORWARDED_HOST, value);
            }
        }
    }

    if let Some(addr) = remote_addr {
        if is_unset(headers, &X_FORWARDED_FOR) {
            if let Ok(value) = HeaderValue::from_str(&addr.to_string()) {
                headers.insert(X_FORWARDED_FOR, value);
            }
        }
    }
}

fn is_unset(headers: &HeaderMap, name: &HeaderName) -> bool {
    headers.get(name).map_or(true, |v| v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inbound() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.append("accept", HeaderValue::from_static("text/plain"));
        headers.append("connection", HeaderValue::from_static("keep-alive"));
        headers.append("x-custom", HeaderValue::from_static("one"));
        headers.append("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.append("x-custom", HeaderValue::from_static("two"));
        headers.append("proxy-authorization", HeaderValue::from_static("Basic Zm9v"));
        headers.append("te", HeaderValue::from_static("trailers"));
        headers.append("upgrade", HeaderValue::from_static("websocket"));
        headers.append("transfer-encoding", HeaderValue::from_static("chunked"));
        headers.append("trailer", HeaderValue::from_static("expires"));
        headers.append("proxy-connection", HeaderValue::from_static("close"));
        headers.append("proxy-authenticate", HeaderValue::from_static("Basic"));
        headers.append("content-type", HeaderValue::from_static("application/json"));
        headers
    }

    #[test]
    fn test_hop_headers_stripped() {
        let out = forwardable_headers(&inbound());
        for name in HOP_HEADERS {
            assert!(!out.contains_key(name), "{} should be stripped", name);
        }
    }

    #[test]
    fn test_other_headers_preserved_in_order() {
        let out = forwardable_headers(&inbound());
        let pairs: Vec<(&str, &str)> = out
            .iter()
            .map(|(k, v)| (k.as_str(), v.to_str().unwrap()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("accept", "text/plain"),
                ("x-custom", "one"),
                ("x-custom", "two"),
                ("content-type", "application/json"),
            ]
        );
    }

    #[test]
    fn test_copy_does_not_alias() {
        let source = inbound();
        let mut out = forwardable_headers(&source);
        out.insert("x-custom", HeaderValue::from_static("changed"));
        assert_eq!(source.get("x-custom").unwrap(), "one");
    }

    #[test]
    fn test_forwarded_headers_added_when_absent() {
        let mut headers = HeaderMap::new();
        let addr: SocketAddr = "10.0.0.7:51234".parse().unwrap();
        set_forwarded_headers(&mut headers, Some("gateway.example.com"), Some(addr));
        assert_eq!(headers.get(X_FORWARDED_HOST).unwrap(), "gateway.example.com");
        assert_eq!(headers.get(X_FORWARDED_FOR).unwrap(), "10.0.0.7:51234");
    }

    #[test]
    fn test_forwarded_headers_left_alone_when_present() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_HOST, HeaderValue::from_static("edge.example.com"));
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("203.0.113.9"));
        let addr: SocketAddr = "10.0.0.7:51234".parse().unwrap();

        set_forwarded_headers(&mut headers, Some("gateway.example.com"), Some(addr));
        set_forwarded_headers(&mut headers, Some("gateway.example.com"), Some(addr));

        assert_eq!(headers.get(X_FORWARDED_HOST).unwrap(), "edge.example.com");
        assert_eq!(headers.get(X_FORWARDED_FOR).unwrap(), "203.0.113.9");
        assert_eq!(headers.get_all(X_FORWARDED_FOR).iter().count(), 1);
    }

    #[test]
    fn test_empty_host_not_forwarded() {
        let mut headers = HeaderMap::new();
        set_forwarded_headers(&mut headers, Some(""), None);
        assert!(headers.is_empty());
    }
}
