//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the shared upstream client
//! - Assemble the function and control-plane forwarding pipelines
//! - Wire up middleware (tracing, request ID, scale gate)
//! - Bind server to listener and drain on shutdown

use axum::{
    http::{header::InvalidHeaderValue, uri::InvalidUri, StatusCode},
    middleware,
    routing::{any, get},
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::cache::{CacheCoherenceInterceptor, FunctionCache, FunctionCacher};
use crate::config::{GatewayConfig, UpstreamConfig};
use crate::http::forwarder::{forward_handler, ForwardingProxy, UpstreamClient};
use crate::observability::{HttpNotifier, LoggingNotifier, NotificationFanout, PrometheusNotifier};
use crate::routing::{
    BaseUrlResolver, FunctionAsHostBaseUrlResolver, FunctionPrefixTrimmingPathTransformer, PathTransformer,
    SingleHostBaseUrlResolver, TransparentPathTransformer,
};
use crate::scaling::{scale_gate_middleware, CachedScaler, RemoteScaler, ScaleGate};
use crate::security::BasicAuthInjector;

/// Failures while assembling the server from configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid scaler URL: {0}")]
    ScalerUrl(#[from] InvalidUri),

    #[error("invalid basic auth credentials: {0}")]
    Credentials(#[from] InvalidHeaderValue),
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
}

impl GatewayServer {
    /// Create a new gateway server with the given configuration.
    pub fn new(config: &GatewayConfig) -> Result<Self, ServerError> {
        let client = build_client(&config.upstream);
        let cache = Arc::new(FunctionCache::new(config.scaling.cache_ttl()));

        let function_proxy = Arc::new(Self::function_proxy(config, client.clone()));
        let system_proxy = Arc::new(Self::system_proxy(config, client.clone(), cache.clone())?);

        let mut function_routes = Router::new()
            .route("/function/{name}", any(forward_handler))
            .route("/function/{name}/", any(forward_handler))
            .route("/function/{name}/{*path}", any(forward_handler))
            .with_state(function_proxy);

        if config.scaling.enabled {
            // Validation guarantees the URL when scaling is on.
            let scaler_url = config.scaling.scaler_url.as_deref().unwrap_or_default();
            let remote = RemoteScaler::new(client, scaler_url)?;
            let scaler = CachedScaler::new(remote, cache.clone() as Arc<dyn FunctionCacher>);
            let gate = Arc::new(ScaleGate::new(
                Arc::new(scaler),
                config.scaling.default_namespace.clone(),
                config.scaling.timeout(),
            ));
            function_routes = function_routes.route_layer(middleware::from_fn_with_state(gate, scale_gate_middleware));
        } else {
            tracing::warn!("Scale-from-zero disabled, invocations are forwarded immediately");
        }

        let system_routes = Router::new()
            .route("/system/{*path}", any(forward_handler))
            .with_state(system_proxy);

        let router = Router::new()
            .merge(function_routes)
            .merge(system_routes)
            .route("/healthz", get(healthz))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        Ok(Self { router })
    }

    fn function_proxy(config: &GatewayConfig, client: UpstreamClient) -> ForwardingProxy {
        let upstream = &config.upstream;
        let (resolver, transformer): (Arc<dyn BaseUrlResolver>, Arc<dyn PathTransformer>) = if upstream.direct_functions {
            (
                Arc::new(FunctionAsHostBaseUrlResolver::new(
                    &upstream.direct_functions_suffix,
                    config.scaling.default_namespace.clone(),
                    upstream.function_port,
                )),
                Arc::new(FunctionPrefixTrimmingPathTransformer),
            )
        } else {
            (
                Arc::new(SingleHostBaseUrlResolver::new(upstream.provider_url.clone())),
                Arc::new(TransparentPathTransformer),
            )
        };

        let notifiers = NotificationFanout::new(vec![
            Arc::new(PrometheusNotifier::new(config.scaling.default_namespace.clone())) as Arc<dyn HttpNotifier>,
            Arc::new(LoggingNotifier) as Arc<dyn HttpNotifier>,
        ]);

        ForwardingProxy::new(client, upstream.timeout(), resolver, transformer)
            .with_notifiers(notifiers)
            .log_upstream_uri(upstream.log_upstream_uri)
    }

    fn system_proxy(
        config: &GatewayConfig,
        client: UpstreamClient,
        cache: Arc<FunctionCache>,
    ) -> Result<ForwardingProxy, ServerError> {
        let upstream = &config.upstream;
        let mut proxy = ForwardingProxy::new(
            client,
            upstream.timeout(),
            Arc::new(SingleHostBaseUrlResolver::new(upstream.provider_url.clone())),
            Arc::new(TransparentPathTransformer),
        )
        .with_notifiers(NotificationFanout::new(vec![Arc::new(LoggingNotifier) as Arc<dyn HttpNotifier>]))
        .log_upstream_uri(upstream.log_upstream_uri);

        if config.control_plane.cache_invalidation {
            proxy = proxy.with_cache_interceptor(CacheCoherenceInterceptor::new(
                cache as Arc<dyn FunctionCacher>,
                config.control_plane.max_body_bytes,
            ));
        }

        if let Some((user, password)) = config.auth.credentials() {
            proxy = proxy.with_auth(Arc::new(BasicAuthInjector::new(user, password)?));
        }

        Ok(proxy)
    }

    /// Run the server until the shutdown channel fires, then drain.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn build_client(config: &UpstreamConfig) -> UpstreamClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(config.connect_timeout()));
    connector.set_nodelay(true);

    Client::builder(TokioExecutor::new())
        .pool_max_idle_per_host(config.max_idle_per_host)
        .build(connector)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
