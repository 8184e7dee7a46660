//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream forwarding settings.
    pub upstream: UpstreamConfig,

    /// Scale-from-zero settings.
    pub scaling: ScalingConfig,

    /// Control-plane cache invalidation.
    pub control_plane: ControlPlaneConfig,

    /// Credentials injected on provider calls.
    pub auth: AuthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream forwarding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Provider base URL; all `/system/...` traffic goes here.
    pub provider_url: String,

    /// Per-call upstream deadline in seconds.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Idle pooled connections kept per upstream host.
    pub max_idle_per_host: usize,

    /// Invoke functions directly instead of through the provider.
    pub direct_functions: bool,

    /// DNS suffix appended to `<name>.<namespace>` in direct mode.
    pub direct_functions_suffix: String,

    /// Port functions listen on in direct mode.
    pub function_port: u16,

    /// Log every upstream URL. Forced on by the `write_request_uri` env var.
    pub log_upstream_uri: bool,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            provider_url: "http://127.0.0.1:8081".to_string(),
            timeout_secs: 60,
            connect_timeout_secs: 5,
            max_idle_per_host: 1024,
            direct_functions: false,
            direct_functions_suffix: String::new(),
            function_port: 8080,
            log_upstream_uri: false,
        }
    }
}

/// Scale-from-zero configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScalingConfig {
    /// Gate invocations on the scaler. Off means forward immediately.
    pub enabled: bool,

    /// Base URL of the external scaling service.
    pub scaler_url: Option<String>,

    /// Longest a request may wait for a ready replica, in seconds.
    pub timeout_secs: u64,

    /// Namespace used when the invocation path names none.
    pub default_namespace: String,

    /// How long a ready function stays cached, in seconds.
    pub cache_ttl_secs: u64,
}

impl ScalingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            scaler_url: None,
            timeout_secs: 30,
            default_namespace: "openfaas-fn".to_string(),
            cache_ttl_secs: 5,
        }
    }
}

/// Control-plane interception configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlPlaneConfig {
    /// Invalidate the function cache on delete / scale-to-zero.
    pub cache_invalidation: bool,

    /// Largest control-plane body buffered for inspection.
    pub max_body_bytes: usize,
}

impl Default for ControlPlaneConfig {
    fn default() -> Self {
        Self {
            cache_invalidation: true,
            max_body_bytes: 1024 * 1024, // 1MB
        }
    }
}

/// Provider credentials. Both fields set enables injection.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    pub basic_auth_user: Option<String>,
    pub basic_auth_password: Option<String>,
}

impl AuthConfig {
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.basic_auth_user, &self.basic_auth_password) {
            (Some(user), Some(password)) => Some((user.as_str(), password.as_str())),
            _ => None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
