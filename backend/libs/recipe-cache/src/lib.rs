//! Recipe cache layer
//!
//! Cache-aside storage shared by the recipe services:
//! - `CacheStore` trait over opaque serialized values
//! - Unified key schema (`recipe:<id>`, `author:<user_id>`)
//! - Fixed entry TTL for every key
//! - Redis and in-process implementations
//! - Metrics integration
//!
//! A cached value may lag behind the durable store. Staleness is bounded by
//! the TTL and by explicit invalidation on write.

mod error;
mod keys;
mod memory;
mod metrics;
mod pool;
mod redis_store;

pub use error::{CacheError, CacheResult};
pub use keys::CacheKey;
pub use memory::InMemoryCacheStore;
pub use metrics::CacheMetrics;
pub use pool::{RedisPool, SharedConnectionManager};
pub use redis_store::RedisCacheStore;

use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::warn;

/// TTL values
pub mod ttl {
    use std::time::Duration;

    /// Every entry in this cache lives for 5 minutes.
    pub const ENTRY: Duration = Duration::from_secs(300);
}

/// Core cache operations over opaque serialized values.
///
/// `get` reports an absent or expired key as `CacheError::NotFound`. Any other
/// error means the cache itself is unavailable.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Get the serialized value stored under `key`
    async fn get(&self, key: &str) -> CacheResult<String>;

    /// Store a serialized value with TTL
    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()>;

    /// Delete a key, returning the number of removed entries
    async fn del(&self, key: &str) -> CacheResult<u64>;
}

/// Read and decode a JSON value.
///
/// A value that no longer decodes (schema drift) is dropped from the cache and
/// reported as a miss.
pub async fn get_json<T: DeserializeOwned>(cache: &dyn CacheStore, key: &str) -> CacheResult<T> {
    let raw = cache.get(key).await?;
    match serde_json::from_str::<T>(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(key = %key, error = %e, "Cache deserialization failed, dropping entry");
            if let Err(del_err) = cache.del(key).await {
                warn!(key = %key, error = %del_err, "Failed to drop corrupted cache entry");
            }
            Err(CacheError::NotFound)
        }
    }
}

/// Encode a value as JSON and store it with the fixed entry TTL.
pub async fn set_json<T: Serialize + Sync>(
    cache: &dyn CacheStore,
    key: &str,
    value: &T,
) -> CacheResult<()> {
    let data = serde_json::to_string(value)?;
    cache.set(key, data, ttl::ENTRY).await
}
