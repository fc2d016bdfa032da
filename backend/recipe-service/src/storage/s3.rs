use anyhow::{anyhow, Context, Result};
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::FileStore;
use crate::config::S3Config;
use crate::models::PhotoUrls;

/// Photo storage on S3 or an S3-compatible endpoint
#[derive(Clone)]
pub struct S3FileStore {
    client: Arc<Client>,
    config: S3Config,
}

impl S3FileStore {
    pub fn new(client: Arc<Client>, config: S3Config) -> Self {
        Self { client, config }
    }

    /// Build a client from the ambient AWS environment, honoring a custom endpoint
    pub async fn connect(config: S3Config) -> Self {
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if !config.endpoint.is_empty() {
            builder = builder
                .endpoint_url(config.endpoint.clone())
                .force_path_style(true);
        }

        Self::new(Arc::new(Client::from_conf(builder.build())), config)
    }

    pub async fn health_check(&self) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
            .with_context(|| format!("bucket {} unreachable", self.config.bucket))?;

        Ok(())
    }

    async fn upload(&self, body: Vec<u8>, content_type: &str) -> Result<String> {
        let key = Uuid::new_v4().to_string();

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .with_context(|| format!("failed to upload photo {}", key))?;

        Ok(self.config.object_url(&key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("failed to delete photo {}", key))?;

        Ok(())
    }
}

/// Object key of a photo URL: its last non-empty path segment
fn object_key(url: &str) -> Option<&str> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|key| !key.is_empty())
}

/// Collapse concurrent upload results in input order. The first error wins;
/// when one is found, whatever did upload is handed to `remove` before the
/// error is returned.
async fn settle_uploads<R, Fut>(results: Vec<Result<String>>, remove: R) -> Result<PhotoUrls>
where
    R: FnOnce(PhotoUrls) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut uploaded = Vec::with_capacity(results.len());
    let mut first_error = None;
    for result in results {
        match result {
            Ok(url) => uploaded.push(url),
            Err(err) if first_error.is_none() => first_error = Some(err),
            Err(err) => debug!("additional photo upload failure: {:#}", err),
        }
    }

    let uploaded = PhotoUrls::new(uploaded);
    let Some(err) = first_error else {
        return Ok(uploaded);
    };

    if !uploaded.is_empty() {
        let count = uploaded.len();
        if let Err(cleanup) = remove(uploaded).await {
            warn!(count, "partial upload cleanup failed: {:#}", cleanup);
        }
    }

    Err(err)
}

#[async_trait::async_trait]
impl FileStore for S3FileStore {
    async fn save(&self, files: Vec<Vec<u8>>, content_type: &str) -> Result<PhotoUrls> {
        let results = join_all(files.into_iter().map(|body| self.upload(body, content_type))).await;

        settle_uploads(results, |uploaded| async move { self.remove(&uploaded).await }).await
    }

    async fn remove(&self, urls: &PhotoUrls) -> Result<()> {
        let keys: Vec<&str> = urls
            .iter()
            .filter(|url| *url != self.config.default_icon_url)
            .filter_map(object_key)
            .collect();

        let mut failures = join_all(keys.into_iter().map(|key| self.delete(key)))
            .await
            .into_iter()
            .filter_map(Result::err);

        match failures.next() {
            None => Ok(()),
            Some(first) => {
                let rest = failures.count();
                if rest == 0 {
                    Err(first)
                } else {
                    Err(anyhow!("{:#} (and {} more)", first, rest))
                }
            }
        }
    }
}
