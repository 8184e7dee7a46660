//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → key.rs (derive FunctionKey for the scale gate)
//!     → resolver.rs (base URL: provider or function-as-host)
//!     → transformer.rs (path sent upstream)
//!     → UpstreamRequestBuilder joins base + path + original query
//! ```
//!
//! # Design Decisions
//! - Resolvers and transformers are pure functions of the request
//! - Implementations are chosen once at startup and shared behind `Arc<dyn _>`
//! - No regex in the hot path (prefix matching only)

pub mod key;
pub mod resolver;
pub mod transformer;

pub use key::FunctionKey;
pub use resolver::{BaseUrlResolver, FunctionAsHostBaseUrlResolver, SingleHostBaseUrlResolver};
pub use transformer::{FunctionPrefixTrimmingPathTransformer, PathTransformer, TransparentPathTransformer};
