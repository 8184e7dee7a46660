//! Gateway error taxonomy.
//!
//! Every failure the request path can terminate with maps to exactly one
//! status code. Malformed control-plane bodies are not errors here: the
//! cache interceptor logs and forwards them.

use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::time::Duration;
use thiserror::Error;

use crate::routing::FunctionKey;

/// Errors produced on the request path.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The scaling collaborator does not know the function.
    #[error("error finding function {key}: {reason}")]
    FunctionNotFound { key: FunctionKey, reason: String },

    /// The scaling collaborator failed while looking up or scaling the function.
    #[error("error finding function {key}: {reason}")]
    Scale { key: FunctionKey, reason: String },

    /// No replica became ready within the allotted wait.
    #[error("function {} 0=>N timed-out after {:.4}s", .key, .elapsed.as_secs_f64())]
    ScaleTimeout { key: FunctionKey, elapsed: Duration },

    /// Transport-level failure calling the backend (refused, DNS, deadline).
    #[error("upstream request to {url} failed: {reason}")]
    UpstreamUnreachable { url: String, reason: String },

    /// The resolved base URL and path did not form a valid URI.
    #[error("invalid upstream URI {uri}: {source}")]
    InvalidUpstreamUri {
        uri: String,
        #[source]
        source: axum::http::uri::InvalidUri,
    },
}

impl GatewayError {
    /// Status code written to the client for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::FunctionNotFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::Scale { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::ScaleTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::UpstreamUnreachable { .. } | GatewayError::InvalidUpstreamUri { .. } => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Bad Gateway is written bare, with no body.
        let body = if status == StatusCode::BAD_GATEWAY {
            Body::empty()
        } else {
            Body::from(self.to_string())
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> FunctionKey {
        FunctionKey::new("figlet", "openfaas-fn")
    }

    #[test]
    fn test_status_mapping() {
        let not_found = GatewayError::FunctionNotFound { key: key(), reason: "no such service".into() };
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let scale = GatewayError::Scale { key: key(), reason: "provider down".into() };
        assert_eq!(scale.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let timeout = GatewayError::ScaleTimeout { key: key(), elapsed: Duration::from_secs(2) };
        assert_eq!(timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);

        let upstream = GatewayError::UpstreamUnreachable { url: "/function/figlet".into(), reason: "refused".into() };
        assert_eq!(upstream.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_diagnostic_names_key_and_cause() {
        let err = GatewayError::FunctionNotFound { key: key(), reason: "no such service".into() };
        assert_eq!(err.to_string(), "error finding function figlet.openfaas-fn: no such service");

        let timeout = GatewayError::ScaleTimeout { key: key(), elapsed: Duration::from_millis(1500) };
        assert_eq!(timeout.to_string(), "function figlet.openfaas-fn 0=>N timed-out after 1.5000s");
    }

    #[tokio::test]
    async fn test_bad_gateway_has_empty_body() {
        let err = GatewayError::UpstreamUnreachable { url: "/x".into(), reason: "refused".into() };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_not_found_carries_diagnostic_body() {
        let err = GatewayError::FunctionNotFound { key: key(), reason: "missing".into() };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"error finding function figlet.openfaas-fn: missing");
    }
}
