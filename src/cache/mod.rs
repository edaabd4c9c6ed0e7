//! In-memory TTL cache
//!
//! Used to hold slow-changing upstream data (the country reference feed)
//! between cycles instead of refetching it on every resolution.
//!
//! # Example
//!
//! ```rust,ignore
//! use cubewatch::cache::TtlCache;
//! use std::time::Duration;
//!
//! let cache: TtlCache<String, Vec<String>> = TtlCache::new(Duration::from_secs(86400));
//! let value = cache
//!     .get_or_try_insert_with("countries".to_string(), || async { fetch().await })
//!     .await?;
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};

struct Entry<V> {
    value: V,
    cached_at: Instant,
}

/// Key/value cache with a single time-to-live for all entries
///
/// A zero TTL disables caching: nothing is stored and every lookup misses.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, Entry<V>>>,
    ttl: Duration,
    // Held while a missing value is computed so concurrent misses share one fill
    fill: Mutex<()>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            fill: Mutex::new(()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Fresh value for `key`, if any
    pub async fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.cached_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// Store `value` under `key`; no-op when caching is disabled
    pub async fn insert(&self, key: K, value: V) {
        if !self.is_enabled() {
            return;
        }
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            Entry {
                value,
                cached_at: Instant::now(),
            },
        );
    }

    /// Return the cached value or compute, store and return a new one
    ///
    /// Concurrent callers that miss wait for a single `compute` and then read
    /// its result. Errors from `compute` are returned unchanged and nothing is
    /// cached, so the next waiter computes again.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key).await {
            return Ok(value);
        }
        if !self.is_enabled() {
            return compute().await;
        }

        let _fill = self.fill.lock().await;
        if let Some(value) = self.get(&key).await {
            return Ok(value);
        }

        let value = compute().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }
}
