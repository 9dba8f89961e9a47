//! Storage seam for cache backends.

use async_trait::async_trait;
use std::time::Duration;
use wayfinder_error::CacheError;

/// Raw byte storage with expiry.
///
/// Keys arrive fully namespaced. A TTL of zero stores the value without
/// expiry.
#[async_trait]
pub trait CacheBackend: Send + Sync + std::fmt::Debug {
    /// Store `value` under `key`, replacing any previous entry.
    async fn set_raw(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Fetch the bytes stored under `key`, or `None` if absent or expired.
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}
