/// Photo storage
use anyhow::Result;

use crate::models::PhotoUrls;

pub mod s3;

pub use s3::S3FileStore;

/// Object storage for recipe photos
#[async_trait::async_trait]
pub trait FileStore: Send + Sync {
    /// Upload every file and return their public URLs in input order.
    /// Nothing stays uploaded when an error is returned.
    async fn save(&self, files: Vec<Vec<u8>>, content_type: &str) -> Result<PhotoUrls>;

    /// Delete the objects behind the given URLs
    async fn remove(&self, urls: &PhotoUrls) -> Result<()>;
}
