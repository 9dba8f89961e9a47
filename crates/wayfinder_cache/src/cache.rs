//! Typed cache facade.

use crate::{CacheBackend, MemoryBackend};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use wayfinder_error::{CacheError, CacheErrorKind};

/// Namespaced, JSON-encoded cache over any [`CacheBackend`].
///
/// Cloning is cheap; clones share the backend.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use wayfinder_cache::Cache;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let cache = Cache::memory("wayfinder:");
/// cache.set("destiny:clan:info", &vec![1, 2, 3], Duration::from_secs(60)).await?;
///
/// let hit: Option<Vec<u32>> = cache.get("destiny:clan:info").await?;
/// assert_eq!(hit, Some(vec![1, 2, 3]));
///
/// let miss: Option<Vec<u32>> = cache.get("destiny:manifest:info").await?;
/// assert!(miss.is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Cache {
    backend: Arc<dyn CacheBackend>,
    prefix: String,
}

impl Cache {
    /// Wrap a backend, prepending `prefix` to every key.
    pub fn new(backend: Arc<dyn CacheBackend>, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
        }
    }

    /// Cache over a fresh in-process backend.
    pub fn memory(prefix: impl Into<String>) -> Self {
        Self::new(Arc::new(MemoryBackend::new()), prefix)
    }

    /// Key namespace.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Name of the backing store.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Serialize `value` and store it under `key` for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or the backend rejects the write.
    #[instrument(skip(self, value), fields(backend = self.backend.name()))]
    pub async fn set<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), CacheError>
    where
        T: Serialize + ?Sized + Sync,
    {
        let bytes = serde_json::to_vec(value).map_err(|e| {
            CacheError::new(CacheErrorKind::Serialization {
                key: key.to_string(),
                message: e.to_string(),
            })
        })?;
        self.backend
            .set_raw(&self.namespaced(key), bytes, ttl)
            .await
    }

    /// Fetch and decode the value under `key`.
    ///
    /// A missing or expired key is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the stored bytes do not
    /// decode as `T`.
    #[instrument(skip(self), fields(backend = self.backend.name()))]
    pub async fn get<T>(&self, key: &str) -> Result<Option<T>, CacheError>
    where
        T: DeserializeOwned,
    {
        let Some(bytes) = self.backend.get_raw(&self.namespaced(key)).await? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            CacheError::new(CacheErrorKind::Serialization {
                key: key.to_string(),
                message: e.to_string(),
            })
        })
    }

    /// Read-through lookup.
    ///
    /// Returns the cached value when present. Otherwise runs `fetch` and, if
    /// it succeeds, writes the result back with `ttl`. Cache failures never
    /// fail the call: a broken read is treated as a miss and a broken
    /// write-back is logged.
    ///
    /// # Errors
    ///
    /// Only errors from `fetch` are returned.
    pub async fn get_or_fetch<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.get::<T>(key).await {
            Ok(Some(hit)) => {
                debug!(key, "Cache hit");
                return Ok(hit);
            }
            Ok(None) => debug!(key, "Cache miss"),
            Err(e) => warn!(key, error = %e, "Cache lookup failed, fetching upstream"),
        }

        let value = fetch().await?;
        if let Err(e) = self.set(key, &value, ttl).await {
            warn!(key, error = %e, "Cache write-back failed");
        }
        Ok(value)
    }
}
