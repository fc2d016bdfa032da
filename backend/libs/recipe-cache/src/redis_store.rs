use crate::{CacheError, CacheMetrics, CacheResult, CacheStore, SharedConnectionManager};
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, warn};

/// Redis-backed cache store
#[derive(Clone)]
pub struct RedisCacheStore {
    redis: SharedConnectionManager,
    metrics: CacheMetrics,
}

impl RedisCacheStore {
    pub fn new(redis: SharedConnectionManager) -> Self {
        Self {
            redis,
            metrics: CacheMetrics::new(),
        }
    }
}

#[async_trait::async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> CacheResult<String> {
        let mut conn = self.redis.lock().await;

        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(data)) => {
                debug!(key = %key, "Cache hit");
                self.metrics.record_hit(key);
                Ok(data)
            }
            Ok(None) => {
                debug!(key = %key, "Cache miss");
                self.metrics.record_miss(key);
                Err(CacheError::NotFound)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Redis get error");
                self.metrics.record_error(key, "redis");
                Err(CacheError::Redis(e))
            }
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.redis.lock().await;
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs())
            .await
            .map_err(|e| {
                self.metrics.record_error(key, "redis");
                CacheError::Redis(e)
            })?;

        debug!(key = %key, ttl = ttl.as_secs(), "Cache set");
        self.metrics.record_write(key);
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<u64> {
        let mut conn = self.redis.lock().await;
        let removed: u64 = conn.del(key).await.map_err(|e| {
            self.metrics.record_error(key, "redis");
            CacheError::Redis(e)
        })?;

        debug!(key = %key, removed, "Cache delete");
        self.metrics.record_invalidation(key);
        Ok(removed)
    }
}
