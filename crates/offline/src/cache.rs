//! Offline read cache: one JSON map under its own key.
//!
//! Strictly best-effort. Every storage failure degrades to a miss or a
//! dropped write, and a full store sheds the cache document itself rather
//! than fail; the queue document is never touched from here.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::KvStore;

/// Storage key of the cache document.
pub const CACHE_KEY: &str = "ppro_cache";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    data: Value,
    cached_at: DateTime<Utc>,
}

/// Best-effort cache for data read while online.
pub struct OfflineCache {
    store: Arc<dyn KvStore>,
}

impl OfflineCache {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Cache a value under `key`. Failures are logged and absorbed.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T) {
        let data = match serde_json::to_value(value) {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!("failed to serialize cache entry {key:?}: {err:?}");
                return;
            }
        };

        let mut entries = self.load().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                data,
                cached_at: Utc::now(),
            },
        );

        let raw = match serde_json::to_string(&entries) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!("failed to serialize cache document: {err:?}");
                return;
            }
        };

        if let Err(err) = self.store.set(CACHE_KEY, &raw).await {
            // Shed the whole cache to make room; it is rebuildable.
            tracing::warn!("cache write failed, dropping cache document: {err:?}");
            if let Err(err) = self.store.remove(CACHE_KEY).await {
                tracing::warn!("failed to drop cache document: {err:?}");
            }
        }
    }

    /// Fetch a cached value, misses on anything older than `max_age`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str, max_age: Option<Duration>) -> Option<T> {
        let entries = self.load().await;
        let entry = entries.get(key)?;

        if let Some(max) = max_age {
            let age = Utc::now().signed_duration_since(entry.cached_at);
            if age > max {
                return None;
            }
        }

        match serde_json::from_value(entry.data.clone()) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!("failed to deserialize cache entry {key:?}: {err:?}");
                None
            }
        }
    }

    async fn load(&self) -> HashMap<String, CacheEntry> {
        let raw = match self.store.get(CACHE_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return HashMap::new(),
            Err(err) => {
                tracing::warn!("failed to read cache document, treating as empty: {err:?}");
                return HashMap::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!("corrupt cache document, treating as empty: {err:?}");
                HashMap::new()
            }
        }
    }
}
