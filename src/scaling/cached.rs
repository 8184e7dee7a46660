//! Cache-aware scaler decorator.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

use crate::cache::{CachedFunction, FunctionCacher};
use crate::routing::FunctionKey;
use crate::scaling::{FunctionScaler, ScaleOutcome};

/// Answers from the function cache while an entry is fresh; otherwise asks
/// the inner scaler and remembers functions that came back ready.
pub struct CachedScaler<S> {
    inner: S,
    cache: Arc<dyn FunctionCacher>,
}

impl<S: FunctionScaler> CachedScaler<S> {
    pub fn new(inner: S, cache: Arc<dyn FunctionCacher>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl<S: FunctionScaler> FunctionScaler for CachedScaler<S> {
    async fn scale(&self, key: &FunctionKey) -> ScaleOutcome {
        let start = Instant::now();
        if let Some(entry) = self.cache.get(key) {
            if entry.available {
                tracing::debug!(function = %key, "Function cache hit");
                return ScaleOutcome::ready(start.elapsed());
            }
        }

        let outcome = self.inner.scale(key).await;
        if outcome.is_ready() {
            self.cache.set(key.clone(), CachedFunction::available_now());
        }
        outcome
    }
}
