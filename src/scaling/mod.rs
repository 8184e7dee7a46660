//! Scale-from-zero subsystem.
//!
//! # Data Flow
//! ```text
//! /function/<name>[.<ns>]/... request
//!     → gate.rs (derive FunctionKey, bounded scale call)
//!         → FunctionScaler (cached.rs → remote.rs)
//!     → outcome.rs (PASS, or BLOCK as 404 / 500 / 504)
//!     → next stage: the forwarding pipeline
//! ```
//!
//! # Design Decisions
//! - The scaling engine is external; this crate only invokes it
//! - No retries here; polling and backoff belong to the scaler
//! - The scale call has its own deadline, independent of the upstream timeout

pub mod cached;
pub mod gate;
pub mod outcome;
pub mod remote;

use async_trait::async_trait;

use crate::routing::FunctionKey;

pub use cached::CachedScaler;
pub use gate::{scale_gate_middleware, ScaleGate};
pub use outcome::ScaleOutcome;
pub use remote::RemoteScaler;

/// The scaling collaborator. May poll internally; must be safe to call
/// concurrently for the same or different keys.
#[async_trait]
pub trait FunctionScaler: Send + Sync {
    async fn scale(&self, key: &FunctionKey) -> ScaleOutcome;
}

