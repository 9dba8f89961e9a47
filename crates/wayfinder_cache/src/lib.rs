//! Cache-aside store for expensive upstream lookups.
//!
//! [`Cache`] is the typed facade callers use. It namespaces keys, encodes
//! values as JSON and delegates storage to a [`CacheBackend`]. Two backends
//! ship here and are interchangeable without touching callers:
//!
//! - [`MemoryBackend`] keeps entries in process and honors TTLs locally
//! - [`RedisBackend`] stores entries in Redis with `SET ... EX`
//!
//! A missing key is never an error. `get` returns `Ok(None)`, and
//! [`Cache::get_or_fetch`] turns any miss into a real upstream fetch.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod cache;
mod memory;
mod remote;

pub use backend::CacheBackend;
pub use cache::Cache;
pub use memory::{CacheEntry, MemoryBackend};
pub use remote::{RedisBackend, RedisSettings, RedisSettingsBuilder};

use std::sync::Arc;
use tracing::{info, instrument, warn};
use wayfinder_core::CacheSettings;
use wayfinder_error::CacheError;

/// Build the cache the deployment asks for.
///
/// Uses Redis when `REDIS_HOST` is set and falls back to an in-process map
/// otherwise. A configured but unreachable Redis is an error.
#[instrument(skip_all, fields(prefix = %settings.prefix()))]
pub async fn cache_from_env(settings: &CacheSettings) -> Result<Cache, CacheError> {
    match RedisSettings::from_env(*settings.redis_port()) {
        Some(redis) => {
            let backend = RedisBackend::connect(&redis).await?;
            info!(host = %redis.host(), port = redis.port(), tls = redis.tls(), "Redis cache configured");
            Ok(Cache::new(Arc::new(backend), settings.prefix().clone()))
        }
        None => {
            warn!("REDIS_HOST not set, cache persistence disabled");
            Ok(Cache::new(
                Arc::new(MemoryBackend::new()),
                settings.prefix().clone(),
            ))
        }
    }
}
