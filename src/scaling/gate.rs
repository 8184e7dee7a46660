//! Scale-from-zero gate.
//!
//! Blocks an invocation until the target function has a ready replica, then
//! hands the untouched request to the next stage. Anything else terminates
//! the request here.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::GatewayError;
use crate::observability::metrics;
use crate::routing::FunctionKey;
use crate::scaling::{FunctionScaler, ScaleOutcome};

pub struct ScaleGate {
    scaler: Arc<dyn FunctionScaler>,
    default_namespace: String,
    timeout: Duration,
}

impl ScaleGate {
    pub fn new(scaler: Arc<dyn FunctionScaler>, default_namespace: impl Into<String>, timeout: Duration) -> Self {
        Self {
            scaler,
            default_namespace: default_namespace.into(),
            timeout,
        }
    }

    /// Run the scale decision for the function addressed by `path`.
    ///
    /// Returns the decision time, as reported by the outcome, when the request
    /// may proceed.
    pub async fn check(&self, path: &str) -> Result<Duration, GatewayError> {
        let start = Instant::now();

        let key = FunctionKey::from_path(path, &self.default_namespace).ok_or_else(|| {
            GatewayError::FunctionNotFound {
                key: FunctionKey::new("", self.default_namespace.as_str()),
                reason: "no function name in request path".to_string(),
            }
        })?;

        // Dropping the scale future on deadline (or on client disconnect,
        // when the whole request task is dropped) releases its resources.
        let outcome = match tokio::time::timeout(self.timeout, self.scaler.scale(&key)).await {
            Ok(outcome) => outcome,
            Err(_) => ScaleOutcome::timed_out(start.elapsed()),
        };

        metrics::record_scale_outcome(outcome.label(), outcome.duration);

        match outcome.into_result(key.clone()) {
            Ok(took) => {
                tracing::info!(function = %key.name(), took = ?took, "[Scale] function ready");
                Ok(took)
            }
            Err(err @ GatewayError::ScaleTimeout { .. }) => {
                tracing::warn!(function = %key, "[Scale] {}", err);
                Err(err)
            }
            Err(err) => {
                tracing::warn!(function = %key, "Scaling: {}", err);
                Err(err)
            }
        }
    }
}

/// Axum middleware wrapping the forwarding pipeline.
pub async fn scale_gate_middleware(
    State(gate): State<Arc<ScaleGate>>,
    request: Request,
    next: Next,
) -> Response {
    match gate.check(request.uri().path()).await {
        Ok(_) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}
