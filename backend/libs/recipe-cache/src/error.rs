//! Cache error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    /// The key is absent or expired. An expected outcome, not a failure.
    #[error("Cache key not found")]
    NotFound,

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound)
    }
}

pub type CacheResult<T> = Result<T, CacheError>;
