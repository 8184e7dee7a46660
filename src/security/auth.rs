//! Credential injection for upstream calls.

use axum::{
    extract::Request,
    http::{header, header::InvalidHeaderValue, HeaderValue},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Mutates an upstream request's credentials in place before it is sent.
pub trait AuthInjector: Send + Sync {
    fn inject(&self, request: &mut Request);
}

/// Sets `Authorization: Basic ...` for the provider's control-plane API.
#[derive(Clone)]
pub struct BasicAuthInjector {
    value: HeaderValue,
}

impl BasicAuthInjector {
    pub fn new(user: &str, password: &str) -> Result<Self, InvalidHeaderValue> {
        let encoded = STANDARD.encode(format!("{}:{}", user, password));
        let mut value = HeaderValue::from_str(&format!("Basic {}", encoded))?;
        value.set_sensitive(true);
        Ok(Self { value })
    }
}

impl std::fmt::Debug for BasicAuthInjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthInjector").finish_non_exhaustive()
    }
}

impl AuthInjector for BasicAuthInjector {
    fn inject(&self, request: &mut Request) {
        request
            .headers_mut()
            .insert(header::AUTHORIZATION, self.value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_basic_auth_injected() {
        let injector = BasicAuthInjector::new("admin", "secret").unwrap();
        let mut request = Request::builder()
            .uri("http://provider:8081/system/functions")
            .header(header::AUTHORIZATION, "Bearer client-token")
            .body(Body::empty())
            .unwrap();

        injector.inject(&mut request);

        let value = request.headers().get(header::AUTHORIZATION).unwrap();
        assert_eq!(value, "Basic YWRtaW46c2VjcmV0");
        assert!(value.is_sensitive());
    }
}
