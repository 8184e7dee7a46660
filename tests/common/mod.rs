//! Shared utilities for integration testing.

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use faas_gateway::config::GatewayConfig;
use faas_gateway::{GatewayServer, Shutdown};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// A request as seen by the mock provider.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Default)]
pub struct MockProvider {
    requests: Mutex<Vec<Recorded>>,
}

impl MockProvider {
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a provider that records every request and echoes its body.
pub async fn start_mock_provider() -> (SocketAddr, Arc<MockProvider>) {
    let provider = Arc::new(MockProvider::default());
    let app = Router::new().fallback(record_and_echo).with_state(provider.clone());
    (serve(app).await, provider)
}

async fn record_and_echo(State(provider): State<Arc<MockProvider>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    provider.requests.lock().unwrap().push(Recorded {
        method: parts.method.to_string(),
        uri: parts.uri.to_string(),
        headers: parts.headers,
        body: body.clone(),
    });
    (StatusCode::OK, [("x-mock", "provider")], body).into_response()
}

/// How the mock scaler answers.
#[derive(Debug, Clone)]
pub enum ScaleReply {
    Ready,
    NotFound,
    Error(String),
    Hang,
}

pub struct MockScaler {
    reply: Mutex<ScaleReply>,
    calls: AtomicUsize,
    last: Mutex<Option<Value>>,
}

impl MockScaler {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<Value> {
        self.last.lock().unwrap().clone()
    }

    pub fn set_reply(&self, reply: ScaleReply) {
        *self.reply.lock().unwrap() = reply;
    }
}

/// Start a scaling service answering `POST /scale`.
pub async fn start_mock_scaler(reply: ScaleReply) -> (SocketAddr, Arc<MockScaler>) {
    let scaler = Arc::new(MockScaler {
        reply: Mutex::new(reply),
        calls: AtomicUsize::new(0),
        last: Mutex::new(None),
    });
    let app = Router::new().route("/scale", post(scale)).with_state(scaler.clone());
    (serve(app).await, scaler)
}

async fn scale(State(scaler): State<Arc<MockScaler>>, Json(payload): Json<Value>) -> Response {
    scaler.calls.fetch_add(1, Ordering::SeqCst);
    *scaler.last.lock().unwrap() = Some(payload);

    let reply = scaler.reply.lock().unwrap().clone();
    match reply {
        ScaleReply::Ready => Json(json!({"found": true, "available": true, "durationMs": 3})).into_response(),
        ScaleReply::NotFound => (StatusCode::NOT_FOUND, "no such function").into_response(),
        ScaleReply::Error(message) => {
            Json(json!({"found": true, "available": false, "error": message})).into_response()
        }
        ScaleReply::Hang => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            StatusCode::OK.into_response()
        }
    }
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address with nothing listening on it.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Config pointing at the given provider and scaler.
pub fn gateway_config(provider: SocketAddr, scaler: Option<SocketAddr>) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.provider_url = format!("http://{}", provider);
    config.upstream.timeout_secs = 5;
    config.observability.metrics_enabled = false;
    match scaler {
        Some(addr) => config.scaling.scaler_url = Some(format!("http://{}", addr)),
        None => config.scaling.enabled = false,
    }
    config
}

pub struct RunningGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl RunningGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Build and run a gateway on an ephemeral port.
pub async fn spawn_gateway(config: GatewayConfig) -> RunningGateway {
    let server = GatewayServer::new(&config).unwrap();
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });
    RunningGateway { addr, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
