//! Client for an external scaling service.
//!
//! Wire contract:
//! `POST <scaler_url>/scale` with `{"name": .., "namespace": ..}` answers
//! `{"found": bool, "available": bool, "error": string?, "durationMs": u64}`.
//! A 404 means the function is unknown.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode, Uri},
};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::routing::FunctionKey;
use crate::scaling::{FunctionScaler, ScaleOutcome};

const MAX_RESPONSE_BYTES: usize = 64 * 1024;

#[derive(Debug, Serialize)]
struct ScaleRequest<'a> {
    name: &'a str,
    namespace: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScaleResponse {
    found: bool,
    available: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    duration_ms: u64,
}

pub struct RemoteScaler {
    client: Client<HttpConnector, Body>,
    endpoint: Uri,
}

impl RemoteScaler {
    pub fn new(client: Client<HttpConnector, Body>, scaler_url: &str) -> Result<Self, axum::http::uri::InvalidUri> {
        let endpoint = format!("{}/scale", scaler_url.trim_end_matches('/')).parse()?;
        Ok(Self { client, endpoint })
    }

    async fn call(&self, key: &FunctionKey) -> Result<ScaleOutcome, String> {
        let payload = serde_json::to_vec(&ScaleRequest {
            name: key.name(),
            namespace: key.namespace(),
        })
        .map_err(|e| e.to_string())?;

        let request = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload))
            .map_err(|e| e.to_string())?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| format!("scaler unreachable: {}", e))?;

        let status = response.status();
        let bytes = axum::body::to_bytes(Body::new(response.into_body()), MAX_RESPONSE_BYTES)
            .await
            .map_err(|e| format!("reading scaler response: {}", e))?;

        if status == StatusCode::NOT_FOUND {
            let reason = String::from_utf8_lossy(&bytes).trim().to_string();
            return Ok(ScaleOutcome {
                found: false,
                available: false,
                error: Some(if reason.is_empty() { "not found".to_string() } else { reason }),
                duration: Duration::ZERO,
            });
        }
        if !status.is_success() {
            return Err(format!("scaler returned {}", status));
        }

        let parsed: ScaleResponse =
            serde_json::from_slice(&bytes).map_err(|e| format!("decoding scaler response: {}", e))?;

        Ok(ScaleOutcome {
            found: parsed.found,
            available: parsed.available,
            error: parsed.error.filter(|e| !e.is_empty()),
            duration: Duration::from_millis(parsed.duration_ms),
        })
    }
}

#[async_trait]
impl FunctionScaler for RemoteScaler {
    async fn scale(&self, key: &FunctionKey) -> ScaleOutcome {
        let start = Instant::now();
        let mut outcome = match self.call(key).await {
            Ok(outcome) => outcome,
            Err(reason) => ScaleOutcome::failed(reason, Duration::ZERO),
        };
        outcome.duration = outcome.duration.max(start.elapsed());
        outcome
    }
}
