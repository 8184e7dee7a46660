//! Upstream base URL resolution.

use axum::extract::Request;

use crate::routing::key::FunctionKey;

/// Resolves the base URL (scheme + authority, no path) a request is forwarded to.
pub trait BaseUrlResolver: Send + Sync {
    fn resolve(&self, request: &Request) -> String;
}

/// Forwards everything to one fixed upstream, e.g. the provider.
#[derive(Debug, Clone)]
pub struct SingleHostBaseUrlResolver {
    base_url: String,
}

impl SingleHostBaseUrlResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl BaseUrlResolver for SingleHostBaseUrlResolver {
    fn resolve(&self, _request: &Request) -> String {
        self.base_url.clone()
    }
}

/// Addresses the function's own service: `http://<name>.<namespace><suffix>:<port>`.
#[derive(Debug, Clone)]
pub struct FunctionAsHostBaseUrlResolver {
    suffix: String,
    default_namespace: String,
    port: u16,
}

impl FunctionAsHostBaseUrlResolver {
    pub fn new(suffix: &str, default_namespace: impl Into<String>, port: u16) -> Self {
        let suffix = match suffix.trim_matches('.') {
            "" => String::new(),
            trimmed => format!(".{}", trimmed),
        };
        Self {
            suffix,
            default_namespace: default_namespace.into(),
            port,
        }
    }
}

impl BaseUrlResolver for FunctionAsHostBaseUrlResolver {
    fn resolve(&self, request: &Request) -> String {
        // A path without a function name yields an unroutable host; the
        // forwarder reports that as a bad gateway.
        let key = FunctionKey::from_path(request.uri().path(), &self.default_namespace)
            .unwrap_or_else(|| FunctionKey::new("", self.default_namespace.as_str()));

        format!(
            "http://{}.{}{}:{}",
            key.name(),
            key.namespace(),
            self.suffix,
            self.port
        )
    }
}
