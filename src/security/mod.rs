//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream request being built:
//!     → headers.rs (strip hop-by-hop, add X-Forwarded-*)
//!     → auth.rs (optional credential injection, control plane only)
//!     → Sent by the forwarder
//! ```
//!
//! # Design Decisions
//! - Header hygiene is stateless; the deny-list is a constant
//! - Credentials are marked sensitive so they never show up in debug output

pub mod auth;
pub mod headers;

pub use auth::{AuthInjector, BasicAuthInjector};
