//! Function cache subsystem.
//!
//! # Data Flow
//! ```text
//! Invocation path:
//!     CachedScaler → function_cache.rs (fresh entry? skip the scaler)
//!
//! Control-plane path (/system/...):
//!     coherence.rs (DELETE /system/functions, POST /system/scale-function/ replicas=0)
//!     → function_cache.rs delete
//!     → then, and only then, the request is forwarded to the provider
//! ```
//!
//! # Design Decisions
//! - The cache is an external collaborator behind `FunctionCacher`
//! - Running without a cache is supported; the interceptor is simply absent
//! - Decode failures are logged and swallowed, forwarding always proceeds

pub mod coherence;
pub mod function_cache;

pub use coherence::{CacheCoherenceInterceptor, ControlPlaneRequest, CACHE_NAMESPACE};
pub use function_cache::{CachedFunction, FunctionCache, FunctionCacher};
