//! Cache invalidation for control-plane requests.
//!
//! Function deletion and explicit scale-to-zero travel through the forwarder
//! on their way to the provider. Before they are sent, the matching cache
//! entry is removed so no concurrent invocation keeps routing to a backend
//! that is about to disappear.

use axum::{
    body::{Body, BodyDataStream, Bytes},
    extract::Request,
    http::Method,
};
use futures_util::{future, stream, StreamExt};
use serde::Deserialize;
use std::sync::Arc;

use crate::cache::function_cache::FunctionCacher;
use crate::observability::metrics;
use crate::routing::FunctionKey;

/// Namespace used for every cache key written from the control-plane path.
pub const CACHE_NAMESPACE: &str = "openfaas-fn";

pub const FUNCTIONS_PATH: &str = "/system/functions";
pub const SCALE_FUNCTION_PATH: &str = "/system/scale-function/";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteFunctionRequest {
    function_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScaleServiceRequest {
    service_name: String,
    #[serde(default)]
    replicas: u64,
}

/// Control-plane request shapes that invalidate the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPlaneRequest {
    DeleteFunction,
    ScaleFunction,
}

impl ControlPlaneRequest {
    pub fn classify(method: &Method, path: &str) -> Option<Self> {
        if method == Method::DELETE && path.starts_with(FUNCTIONS_PATH) {
            Some(Self::DeleteFunction)
        } else if method == Method::POST && path.starts_with(SCALE_FUNCTION_PATH) {
            Some(Self::ScaleFunction)
        } else {
            None
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::DeleteFunction => "delete",
            Self::ScaleFunction => "scale_to_zero",
        }
    }

    /// Decode the body and return the cache key to drop, if any.
    pub fn invalidation_target(self, body: &[u8]) -> serde_json::Result<Option<FunctionKey>> {
        match self {
            Self::DeleteFunction => {
                let req: DeleteFunctionRequest = serde_json::from_slice(body)?;
                Ok(Some(FunctionKey::new(req.function_name, CACHE_NAMESPACE)))
            }
            Self::ScaleFunction => {
                let req: ScaleServiceRequest = serde_json::from_slice(body)?;
                Ok((req.replicas == 0).then(|| FunctionKey::new(req.service_name, CACHE_NAMESPACE)))
            }
        }
    }
}

/// Drops cache entries for functions being deleted or scaled to zero.
pub struct CacheCoherenceInterceptor {
    cache: Arc<dyn FunctionCacher>,
    max_body_bytes: usize,
}

impl CacheCoherenceInterceptor {
    pub fn new(cache: Arc<dyn FunctionCacher>, max_body_bytes: usize) -> Self {
        Self {
            cache,
            max_body_bytes,
        }
    }

    /// Inspect `request` and invalidate before it is forwarded.
    ///
    /// The body of a matching request is buffered and put back as a fresh
    /// stream carrying the same bytes; other requests pass through untouched.
    /// Bodies over `max_body_bytes` are not decoded: the bytes read so far are
    /// replayed ahead of the unread remainder.
    pub async fn intercept(&self, request: Request, request_path: &str) -> Request {
        let Some(shape) = ControlPlaneRequest::classify(request.method(), request_path) else {
            return request;
        };

        let (parts, body) = request.into_parts();
        let bytes = match buffer_body(body, self.max_body_bytes).await {
            Buffered::Complete(bytes) => bytes,
            Buffered::Oversized(prefix, rest) => {
                tracing::warn!(
                    path = %request_path,
                    limit = self.max_body_bytes,
                    "Control-plane body too large to inspect, cache left untouched"
                );
                let replay = stream::once(future::ready(Ok(prefix))).chain(rest);
                return Request::from_parts(parts, Body::from_stream(replay));
            }
            Buffered::Failed(prefix, e) => {
                // Propagate the failure upstream instead of sending a short body.
                tracing::warn!(path = %request_path, error = %e, "Failed to buffer control-plane body");
                let replay = stream::iter([Ok(prefix), Err(e)]);
                return Request::from_parts(parts, Body::from_stream(replay));
            }
        };

        match shape.invalidation_target(&bytes) {
            Ok(Some(key)) => {
                self.cache.delete(&key);
                metrics::record_cache_invalidation(shape.label());
                tracing::info!(function = %key, shape = shape.label(), "Invalidated function cache entry");
            }
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(path = %request_path, error = %e, "Skipping cache invalidation");
            }
        }

        Request::from_parts(parts, Body::from(bytes))
    }
}

enum Buffered {
    Complete(Bytes),
    Oversized(Bytes, BodyDataStream),
    Failed(Bytes, axum::Error),
}

async fn buffer_body(body: Body, limit: usize) -> Buffered {
    let mut stream = body.into_data_stream();
    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(chunk) => {
                buf.extend_from_slice(&chunk);
                if buf.len() > limit {
                    return Buffered::Oversized(Bytes::from(buf), stream);
                }
            }
            Err(e) => return Buffered::Failed(Bytes::from(buf), e),
        }
    }
    Buffered::Complete(Bytes::from(buf))
}
