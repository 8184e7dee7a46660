//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarder produces:
//!     → notifier.rs (started/completed lifecycle events)
//!         → LoggingNotifier (one line per request)
//!         → PrometheusNotifier → metrics.rs
//! Scale gate and cache interceptor produce:
//!     → logging.rs subscriber (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Notifiers are synchronous and ordered; no fan-out concurrency
//! - Request ID flows upstream via `x-request-id`
//! - Metrics are cheap (atomic increments) and no-ops without a recorder

pub mod logging;
pub mod metrics;
pub mod notifier;

pub use notifier::{HttpNotifier, LifecycleEvent, LoggingNotifier, NotificationFanout, Phase, PrometheusNotifier};
