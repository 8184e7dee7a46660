//! Reverse-proxy forwarder.
//!
//! # Responsibilities
//! - Emit started/completed lifecycle events around each forward
//! - Run cache invalidation before the upstream call, when configured
//! - Execute the upstream call under a deadline
//! - Relay status, headers and a streamed body back to the client
//! - Stamp X-Gateway-Start / X-Gateway-End on successful forwards
//!
//! # Design Decisions
//! - One pooled client shared by every request
//! - No retries: an upstream request is built once and sent once
//! - Transport failures become a bare 502
//! - The deadline also bounds response body streaming; passing it mid-body
//!   aborts the client connection
//! - The completed event is timed to the end of the relayed body

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, SecondsFormat, Utc};
use futures_util::{stream::BoxStream, Stream, StreamExt};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{Instant, Sleep};

use crate::cache::CacheCoherenceInterceptor;
use crate::error::GatewayError;
use crate::http::upstream::build_upstream_request;
use crate::observability::NotificationFanout;
use crate::routing::{BaseUrlResolver, PathTransformer};
use crate::security::AuthInjector;

pub const X_GATEWAY_START: HeaderName = HeaderName::from_static("x-gateway-start");
pub const X_GATEWAY_END: HeaderName = HeaderName::from_static("x-gateway-end");

/// Pooled upstream HTTP client.
pub type UpstreamClient = Client<HttpConnector, Body>;

pub struct ForwardingProxy {
    client: UpstreamClient,
    timeout: Duration,
    resolver: Arc<dyn BaseUrlResolver>,
    transformer: Arc<dyn PathTransformer>,
    auth: Option<Arc<dyn AuthInjector>>,
    cache_interceptor: Option<CacheCoherenceInterceptor>,
    notifiers: NotificationFanout,
    log_upstream_uri: bool,
}

impl ForwardingProxy {
    pub fn new(
        client: UpstreamClient,
        timeout: Duration,
        resolver: Arc<dyn BaseUrlResolver>,
        transformer: Arc<dyn PathTransformer>,
    ) -> Self {
        Self {
            client,
            timeout,
            resolver,
            transformer,
            auth: None,
            cache_interceptor: None,
            notifiers: NotificationFanout::default(),
            log_upstream_uri: false,
        }
    }

    pub fn with_auth(mut self, auth: Arc<dyn AuthInjector>) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_cache_interceptor(mut self, interceptor: CacheCoherenceInterceptor) -> Self {
        self.cache_interceptor = Some(interceptor);
        self
    }

    pub fn with_notifiers(mut self, notifiers: NotificationFanout) -> Self {
        self.notifiers = notifiers;
        self
    }

    pub fn log_upstream_uri(mut self, enabled: bool) -> Self {
        self.log_upstream_uri = enabled;
        self
    }

    /// Full forwarding pipeline for one request.
    ///
    /// The completed event fires once the relayed body has been fully sent,
    /// has failed, or was dropped by the client.
    pub async fn handle(&self, request: Request) -> Response {
        let base_url = self.resolver.resolve(&request);
        let original_path = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| request.uri().path().to_string());
        let request_path = self.transformer.transform(&request);
        let method = request.method().clone();

        self.notifiers.started(&method, &request_path, &original_path);

        // Must finish before the upstream call is issued.
        let request = match &self.cache_interceptor {
            Some(interceptor) => interceptor.intercept(request, &request_path).await,
            None => request,
        };

        let start = Instant::now();
        match self.forward_request(request, &base_url, &request_path).await {
            Ok(response) => {
                let completion = Completion {
                    notifiers: self.notifiers.clone(),
                    method,
                    path: request_path,
                    original_path,
                    status: response.status(),
                    start,
                };
                response.map(|body| Body::from_stream(body.on_complete(completion)))
            }
            Err(e) => {
                tracing::error!(url = %request_path, error = %e, "Error with upstream request");
                let response = e.into_response();
                self.notifiers
                    .completed(&method, &request_path, &original_path, response.status(), start.elapsed());
                response
            }
        }
    }

    /// Send the request upstream and relay the response.
    pub async fn forward_request(
        &self,
        request: Request,
        base_url: &str,
        request_path: &str,
    ) -> Result<axum::http::Response<RelayBody>, GatewayError> {
        let proxy_start = Utc::now();

        let mut upstream = build_upstream_request(request, base_url, request_path)?;
        if let Some(auth) = &self.auth {
            auth.inject(&mut upstream);
        }

        let url = upstream.uri().to_string();
        if self.log_upstream_uri {
            tracing::info!(
                host = upstream.uri().authority().map(|a| a.as_str()).unwrap_or_default(),
                url = %url,
                "Forwarding request"
            );
        }

        let deadline = Instant::now() + self.timeout;
        let response = match tokio::time::timeout_at(deadline, self.client.request(upstream)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(GatewayError::UpstreamUnreachable { url, reason: e.to_string() });
            }
            Err(_) => {
                return Err(GatewayError::UpstreamUnreachable {
                    url,
                    reason: format!("deadline of {:?} exceeded", self.timeout),
                });
            }
        };
        let proxy_end = Utc::now();

        let (mut parts, body) = response.into_parts();
        if let Some(value) = timestamp(proxy_start) {
            parts.headers.append(X_GATEWAY_START, value);
        }
        if let Some(value) = timestamp(proxy_end) {
            parts.headers.append(X_GATEWAY_END, value);
        }

        let body = RelayBody {
            inner: Body::new(body).into_data_stream().boxed(),
            deadline: Box::pin(tokio::time::sleep_until(deadline)),
            url,
            completion: None,
            done: false,
        };
        Ok(axum::http::Response::from_parts(parts, body))
    }
}

/// Completed-event details held until the response body is finished.
struct Completion {
    notifiers: NotificationFanout,
    method: Method,
    path: String,
    original_path: String,
    status: StatusCode,
    start: Instant,
}

impl Completion {
    fn emit(self, status: StatusCode) {
        self.notifiers
            .completed(&self.method, &self.path, &self.original_path, status, self.start.elapsed());
    }
}

/// Upstream response body, streamed frame by frame.
///
/// Yields an error once the upstream deadline passes so the client
/// connection is aborted rather than ended cleanly on a truncated body.
pub struct RelayBody {
    inner: BoxStream<'static, Result<Bytes, axum::Error>>,
    deadline: Pin<Box<Sleep>>,
    url: String,
    completion: Option<Completion>,
    done: bool,
}

impl RelayBody {
    fn on_complete(mut self, completion: Completion) -> Self {
        self.completion = Some(completion);
        self
    }

    /// `None` keeps the upstream status.
    fn finish(&mut self, failure: Option<StatusCode>) {
        self.done = true;
        if let Some(completion) = self.completion.take() {
            let status = failure.unwrap_or(completion.status);
            completion.emit(status);
        }
    }
}

impl Stream for RelayBody {
    type Item = Result<Bytes, axum::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        if this.deadline.as_mut().poll(cx).is_ready() {
            tracing::warn!(url = %this.url, "Upstream deadline exceeded while streaming response body");
            this.finish(Some(StatusCode::BAD_GATEWAY));
            return Poll::Ready(Some(Err(axum::Error::new(GatewayError::UpstreamUnreachable {
                url: this.url.clone(),
                reason: "deadline exceeded while streaming response body".to_string(),
            }))));
        }

        match this.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(bytes))) => Poll::Ready(Some(Ok(bytes))),
            Poll::Ready(Some(Err(e))) => {
                tracing::warn!(url = %this.url, error = %e, "Upstream response body failed");
                this.finish(Some(StatusCode::BAD_GATEWAY));
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.finish(None);
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

// Client went away mid-body.
impl Drop for RelayBody {
    fn drop(&mut self) {
        self.finish(None);
    }
}

impl fmt::Debug for RelayBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayBody").field("url", &self.url).field("done", &self.done).finish()
    }
}

/// RFC 3339 with nanosecond precision.
fn timestamp(at: DateTime<Utc>) -> Option<HeaderValue> {
    HeaderValue::from_str(&at.to_rfc3339_opts(SecondsFormat::Nanos, true)).ok()
}

pub async fn forward_handler(State(proxy): State<Arc<ForwardingProxy>>, request: Request) -> Response {
    proxy.handle(request).await
}
