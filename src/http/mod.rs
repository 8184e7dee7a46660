//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, route by /function or /system)
//!     → [scale gate, invocations only]
//!     → forwarder.rs (events, cache invalidation, deadline)
//!     → upstream.rs (URL, header hygiene, X-Forwarded-*)
//!     → upstream response streamed back to the client
//! ```

pub mod forwarder;
pub mod server;
pub mod upstream;

pub use forwarder::{ForwardingProxy, UpstreamClient, X_GATEWAY_END, X_GATEWAY_START};
pub use server::{GatewayServer, ServerError};
