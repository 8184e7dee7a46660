//! Request lifecycle notifications.
//!
//! Every forwarded request produces a `Started` event before dispatch and a
//! `Completed` event afterwards. Notifiers run synchronously, in order, on
//! the request task.

use axum::http::{Method, StatusCode};
use std::sync::Arc;
use std::time::Duration;

use crate::observability::metrics;
use crate::routing::FunctionKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Started,
    Completed,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Started => "started",
            Phase::Completed => "completed",
        }
    }
}

/// Read-only snapshot handed to each notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub method: Method,
    /// Path sent upstream.
    pub path: String,
    /// Path and query as received by the gateway.
    pub original_path: String,
    pub status: StatusCode,
    pub phase: Phase,
    pub elapsed: Duration,
}

/// Observer of request lifecycle events.
pub trait HttpNotifier: Send + Sync {
    fn notify(&self, event: &LifecycleEvent);
}

/// Delivers events to every configured notifier, in configuration order.
#[derive(Clone, Default)]
pub struct NotificationFanout {
    notifiers: Vec<Arc<dyn HttpNotifier>>,
}

impl NotificationFanout {
    pub fn new(notifiers: Vec<Arc<dyn HttpNotifier>>) -> Self {
        Self { notifiers }
    }

    pub fn started(&self, method: &Method, path: &str, original_path: &str) {
        self.emit(&LifecycleEvent {
            method: method.clone(),
            path: path.to_string(),
            original_path: original_path.to_string(),
            status: StatusCode::PROCESSING,
            phase: Phase::Started,
            elapsed: Duration::ZERO,
        });
    }

    pub fn completed(
        &self,
        method: &Method,
        path: &str,
        original_path: &str,
        status: StatusCode,
        elapsed: Duration,
    ) {
        self.emit(&LifecycleEvent {
            method: method.clone(),
            path: path.to_string(),
            original_path: original_path.to_string(),
            status,
            phase: Phase::Completed,
            elapsed,
        });
    }

    fn emit(&self, event: &LifecycleEvent) {
        for notifier in &self.notifiers {
            notifier.notify(event);
        }
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

/// Logs one line per completed request.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotifier;

impl HttpNotifier for LoggingNotifier {
    fn notify(&self, event: &LifecycleEvent) {
        if event.phase == Phase::Completed {
            tracing::info!(
                method = %event.method,
                path = %event.path,
                status = event.status.as_u16(),
                elapsed_secs = event.elapsed.as_secs_f64(),
                "Forwarded request"
            );
        }
    }
}

/// Feeds per-function invocation metrics.
#[derive(Debug, Clone)]
pub struct PrometheusNotifier {
    default_namespace: String,
}

impl PrometheusNotifier {
    pub fn new(default_namespace: impl Into<String>) -> Self {
        Self {
            default_namespace: default_namespace.into(),
        }
    }
}

impl HttpNotifier for PrometheusNotifier {
    fn notify(&self, event: &LifecycleEvent) {
        let Some(key) = FunctionKey::from_path(&event.original_path, &self.default_namespace) else {
            return;
        };
        let function = key.to_string();

        match event.phase {
            Phase::Started => metrics::record_invocation_started(&function),
            Phase::Completed => {
                metrics::record_invocation_completed(&function, event.status.as_u16(), event.elapsed)
            }
        }
    }
}
