//! Function readiness cache.
//!
//! # Responsibilities
//! - Remember which functions were recently seen with a ready replica
//! - Expire entries after a fixed TTL
//! - Allow explicit invalidation from the control-plane path

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::routing::FunctionKey;

/// A cached readiness observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedFunction {
    pub available: bool,
    pub cached_at: Instant,
}

impl CachedFunction {
    pub fn available_now() -> Self {
        Self {
            available: true,
            cached_at: Instant::now(),
        }
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() >= ttl
    }
}

/// Shared function cache. Implementations must tolerate concurrent callers;
/// deleting an absent key is not an error.
pub trait FunctionCacher: Send + Sync {
    fn get(&self, key: &FunctionKey) -> Option<CachedFunction>;
    fn set(&self, key: FunctionKey, entry: CachedFunction);
    fn delete(&self, key: &FunctionKey);
}

/// In-memory TTL cache backed by a concurrent map.
#[derive(Debug, Clone)]
pub struct FunctionCache {
    inner: Arc<DashMap<FunctionKey, CachedFunction>>,
    ttl: Duration,
}

impl FunctionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl FunctionCacher for FunctionCache {
    fn get(&self, key: &FunctionKey) -> Option<CachedFunction> {
        let entry = *self.inner.get(key)?;
        if entry.is_expired(self.ttl) {
            self.inner.remove_if(key, |_, v| v.is_expired(self.ttl));
            return None;
        }
        Some(entry)
    }

    fn set(&self, key: FunctionKey, entry: CachedFunction) {
        self.inner.insert(key, entry);
    }

    fn delete(&self, key: &FunctionKey) {
        if self.inner.remove(key).is_some() {
            tracing::debug!(function = %key, "Function cache entry removed");
        }
    }
}
