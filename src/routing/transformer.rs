//! Request path rewriting for the upstream call.

use axum::extract::Request;

use crate::routing::key::{service_name, FUNCTION_PATH_PREFIX};

/// Produces the path (without query) sent upstream.
pub trait PathTransformer: Send + Sync {
    fn transform(&self, request: &Request) -> String;
}

/// Leaves the path untouched; used when forwarding through the provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransparentPathTransformer;

impl PathTransformer for TransparentPathTransformer {
    fn transform(&self, request: &Request) -> String {
        request.uri().path().to_string()
    }
}

/// Drops the `/function/<name>` prefix so the function sees only the rest of the path.
#[derive(Debug, Clone, Copy, Default)]
pub struct FunctionPrefixTrimmingPathTransformer;

impl PathTransformer for FunctionPrefixTrimmingPathTransformer {
    fn transform(&self, request: &Request) -> String {
        let path = request.uri().path();
        match service_name(path) {
            Some(name) => {
                let prefix_len = FUNCTION_PATH_PREFIX.len() + name.len();
                path.get(prefix_len..).unwrap_or_default().to_string()
            }
            None => path.to_string(),
        }
    }
}
