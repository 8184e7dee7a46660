//! Upstream request construction.
//!
//! # Responsibilities
//! - Join base URL, transformed path and the original query string
//! - Copy method and filtered headers
//! - Add forwarding metadata
//! - Move the inbound body into the upstream request without buffering it

use axum::{
    extract::{ConnectInfo, Request},
    http::{header, request::Parts, Uri},
};
use std::net::SocketAddr;

use crate::error::GatewayError;
use crate::security::headers::{forwardable_headers, set_forwarded_headers};

/// `base_url + path`, plus `?query` when the inbound request carried one.
pub fn upstream_url(base_url: &str, path: &str, query: Option<&str>) -> String {
    match query.filter(|q| !q.is_empty()) {
        Some(query) => format!("{}{}?{}", base_url, path, query),
        None => format!("{}{}", base_url, path),
    }
}

/// Build the request sent to the backend. Consumes the inbound request so
/// its body stream is handed over rather than copied.
pub fn build_upstream_request(
    request: Request,
    base_url: &str,
    request_path: &str,
) -> Result<Request, GatewayError> {
    let (parts, body) = request.into_parts();

    let url = upstream_url(base_url, request_path, parts.uri.query());
    let uri: Uri = url
        .parse()
        .map_err(|source| GatewayError::InvalidUpstreamUri { uri: url.clone(), source })?;

    let mut headers = forwardable_headers(&parts.headers);
    let remote_addr = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    set_forwarded_headers(&mut headers, inbound_host(&parts), remote_addr);

    let mut upstream = Request::new(body);
    *upstream.method_mut() = parts.method;
    *upstream.uri_mut() = uri;
    *upstream.headers_mut() = headers;
    Ok(upstream)
}

/// The Host the client addressed: the header for HTTP/1, the authority for HTTP/2.
fn inbound_host(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| parts.uri.authority().map(|a| a.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderValue, Method};
    use crate::security::headers::{X_FORWARDED_FOR, X_FORWARDED_HOST};

    fn inbound(uri: &str) -> Request {
        let mut request = Request::builder()
            .method(Method::PUT)
            .uri(uri)
            .header(header::HOST, "gateway.local:8080")
            .header("connection", "keep-alive, upgrade")
            .header("upgrade", "h2c")
            .header("x-custom", "v")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("hello"))
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo("192.168.1.20:40000".parse::<SocketAddr>().unwrap()));
        request
    }

    #[test]
    fn test_url_joining() {
        assert_eq!(upstream_url("http://p:8081", "/system/functions", None), "http://p:8081/system/functions");
        assert_eq!(upstream_url("http://p:8081", "/a", Some("x=1&y=2")), "http://p:8081/a?x=1&y=2");
        assert_eq!(upstream_url("http://p:8081", "/a", Some("")), "http://p:8081/a");
        assert_eq!(upstream_url("http://f:8080", "", None), "http://f:8080");
    }

    #[tokio::test]
    async fn test_builds_request() {
        let upstream = build_upstream_request(
            inbound("/function/figlet/x?name=a%20b&z"),
            "http://figlet.openfaas-fn:8080",
            "/x",
        )
        .unwrap();

        assert_eq!(upstream.method(), Method::PUT);
        assert_eq!(upstream.uri(), "http://figlet.openfaas-fn:8080/x?name=a%20b&z");

        let headers = upstream.headers();
        assert!(headers.get("connection").is_none());
        assert!(headers.get("upgrade").is_none());
        assert!(headers.get(header::HOST).is_none());
        assert_eq!(headers.get("x-custom").unwrap(), "v");
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(headers.get(X_FORWARDED_HOST).unwrap(), "gateway.local:8080");
        assert_eq!(headers.get(X_FORWARDED_FOR).unwrap(), "192.168.1.20:40000");

        let body = axum::body::to_bytes(upstream.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"hello");
    }

    #[test]
    fn test_existing_forwarding_headers_kept() {
        let mut request = inbound("/system/functions");
        request.headers_mut().insert(X_FORWARDED_HOST, HeaderValue::from_static("edge"));
        request.headers_mut().insert(X_FORWARDED_FOR, HeaderValue::from_static("1.2.3.4"));

        let upstream = build_upstream_request(request, "http://p:8081", "/system/functions").unwrap();
        assert_eq!(upstream.headers().get(X_FORWARDED_HOST).unwrap(), "edge");
        assert_eq!(upstream.headers().get(X_FORWARDED_FOR).unwrap(), "1.2.3.4");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = build_upstream_request(inbound("/x"), "http://bad host", "/x").unwrap_err();
        assert!(matches!(err, GatewayError::InvalidUpstreamUri { .. }));
    }
}
