use recipe_cache::{get_json, set_json, CacheKey, CacheStore};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::db::UserStore;
use crate::error::{Result, ServiceError};
use crate::models::{Author, UserId};

/// Cache-aside projection of users into `Author`.
///
/// Entries under `author:<id>` are never invalidated from this service.
/// Whoever changes a user's login or icon must call [`AuthorResolver::invalidate`]
/// or accept staleness up to the cache TTL.
pub struct AuthorResolver {
    cache: Arc<dyn CacheStore>,
    users: Arc<dyn UserStore>,
}

impl AuthorResolver {
    pub fn new(cache: Arc<dyn CacheStore>, users: Arc<dyn UserStore>) -> Self {
        Self { cache, users }
    }

    pub async fn get_author(&self, user_id: UserId) -> Result<Author> {
        let key = CacheKey::author(user_id);

        match get_json::<Author>(&*self.cache, &key).await {
            Ok(author) => {
                debug!(user_id, "author cache hit");
                return Ok(author);
            }
            Err(err) if err.is_not_found() => debug!(user_id, "author cache miss"),
            Err(err) => return Err(err.into()),
        }

        let author = self
            .users
            .get_author(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        if let Err(err) = set_json(&*self.cache, &key, &author).await {
            warn!(user_id, "author cache set failed: {}", err);
        }

        Ok(author)
    }

    /// Drop the cached projection of a user
    pub async fn invalidate(&self, user_id: UserId) -> Result<()> {
        let removed = self.cache.del(&CacheKey::author(user_id)).await?;
        debug!(user_id, removed, "author cache invalidated");
        Ok(())
    }
}
