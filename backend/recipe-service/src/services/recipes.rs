/// Recipe service - cache-aside retrieval, aggregate composition and writes
///
/// Only the bare `Recipe` is cached under `recipe:<id>`. Likes, comments and
/// authors are fetched on every read so counts never go stale with the body.
use futures::future::try_join_all;
use recipe_cache::{get_json, set_json, CacheKey, CacheStore};
use std::sync::Arc;
use tracing::{debug, info, warn};
use validator::Validate;

use super::comments::comment_views;
use super::{AuthorResolver, Collaborators, SubscriptionService};
use crate::db::{CommentRegistry, LikeRegistry, RecipeStore, UserStore};
use crate::error::{Result, ServiceError};
use crate::metrics::{outcome, PHOTO_CLEANUPS_TOTAL, PHOTO_COMPENSATIONS_TOTAL};
use crate::models::{
    FullRecipe, NewRecipe, PhotoUpload, PhotoUrls, Recipe, RecipeChanges, RecipeDraft,
    RecipeFilter, RecipeId, RecipeWithAuthor, User, UserId,
};
use crate::storage::FileStore;

pub struct RecipeAggregateService {
    cache: Arc<dyn CacheStore>,
    recipes: Arc<dyn RecipeStore>,
    users: Arc<dyn UserStore>,
    likes: Arc<dyn LikeRegistry>,
    comments: Arc<dyn CommentRegistry>,
    files: Arc<dyn FileStore>,
    authors: Arc<AuthorResolver>,
    subscriptions: Arc<SubscriptionService>,
}

impl RecipeAggregateService {
    pub fn new(
        deps: &Collaborators,
        authors: Arc<AuthorResolver>,
        subscriptions: Arc<SubscriptionService>,
    ) -> Self {
        Self {
            cache: deps.cache.clone(),
            recipes: deps.recipes.clone(),
            users: deps.users.clone(),
            likes: deps.likes.clone(),
            comments: deps.comments.clone(),
            files: deps.files.clone(),
            authors,
            subscriptions,
        }
    }

    /// Full read aggregate of a recipe.
    ///
    /// `requestor` is `None` for unauthenticated callers, in which case
    /// `is_liked` is false and the like lookup is skipped.
    pub async fn get(&self, recipe_id: RecipeId, requestor: Option<UserId>) -> Result<FullRecipe> {
        let recipe = self.load_recipe(recipe_id, true).await?;

        let (author, likes_count, is_liked, comments) = tokio::try_join!(
            self.authors.get_author(recipe.owner_id),
            async { Ok::<_, ServiceError>(self.likes.likes_count(recipe_id).await?) },
            async {
                let is_liked = match requestor {
                    Some(user_id) => self.likes.is_liked(user_id, recipe_id).await?,
                    None => false,
                };
                Ok::<_, ServiceError>(is_liked)
            },
            comment_views(&*self.comments, &self.authors, recipe_id),
        )?;

        Ok(FullRecipe {
            recipe,
            author,
            likes_count,
            is_liked,
            comments,
        })
    }

    pub async fn get_all(&self) -> Result<Vec<RecipeWithAuthor>> {
        let recipes = self.recipes.get_all().await?;
        self.with_authors(recipes).await
    }

    /// Text search with ordering and paging
    pub async fn get_filtered(&self, filter: RecipeFilter) -> Result<Vec<RecipeWithAuthor>> {
        let query = filter.into_query()?;
        let recipes = self.recipes.get_filtered(&query).await?;
        self.with_authors(recipes).await
    }

    /// Create a recipe and announce it to subscribers.
    ///
    /// If the announcement fails the recipe stays created and the error
    /// carries its id (see [`ServiceError::created_recipe_id`]).
    pub async fn create(
        &self,
        login: &str,
        owner_id: UserId,
        fields: NewRecipe,
        photos: PhotoUpload,
    ) -> Result<RecipeId> {
        self.authorize(login, owner_id).await?;
        if photos.is_empty() {
            return Err(ServiceError::EmptyPhotos);
        }
        fields.validate()?;

        let photo_urls = self.files.save(photos.files, &photos.content_type).await?;
        let draft = RecipeDraft {
            owner_id,
            fields,
            photo_urls,
        };

        let recipe_id = match self.recipes.create(&draft).await {
            Ok(id) => id,
            Err(err) => return Err(self.compensate("create", err, &draft.photo_urls).await),
        };
        info!(recipe_id, owner_id, "recipe created");

        self.subscriptions
            .notify_new_recipe(owner_id, recipe_id)
            .await?;

        Ok(recipe_id)
    }

    /// Apply a partial update, optionally replacing every photo.
    ///
    /// Old photos are removed only once the new state is persisted and the
    /// cache entry is gone.
    pub async fn update(
        &self,
        login: &str,
        owner_id: UserId,
        recipe_id: RecipeId,
        changes: RecipeChanges,
        photos: PhotoUpload,
    ) -> Result<()> {
        changes.validate()?;
        let mut recipe = self.load_owned(login, owner_id, recipe_id).await?;

        if changes.is_empty() && photos.is_empty() {
            debug!(recipe_id, "empty recipe update, nothing to persist");
            return Ok(());
        }

        changes.apply_to(&mut recipe);

        let mut replaced = None;
        if !photos.is_empty() {
            let uploaded = self.files.save(photos.files, &photos.content_type).await?;
            replaced = Some(std::mem::replace(&mut recipe.photo_urls, uploaded));
        }

        if let Err(err) = self.recipes.update(&recipe).await {
            return Err(match replaced {
                Some(_) => self.compensate("update", err, &recipe.photo_urls).await,
                None => err.into(),
            });
        }

        self.invalidate(recipe_id).await?;
        info!(recipe_id, "recipe updated");

        if let Some(old_photos) = replaced {
            self.cleanup_photos("update", recipe_id, &old_photos).await;
        }

        Ok(())
    }

    /// Delete a recipe, then remove its photos best-effort
    pub async fn delete(&self, login: &str, owner_id: UserId, recipe_id: RecipeId) -> Result<()> {
        let recipe = self.load_owned(login, owner_id, recipe_id).await?;

        self.recipes.delete(recipe_id).await?;
        self.invalidate(recipe_id).await?;
        info!(recipe_id, "recipe deleted");

        self.cleanup_photos("delete", recipe_id, &recipe.photo_urls).await;

        Ok(())
    }

    /// Cache-or-store load. `fill` writes the store value back on a miss.
    async fn load_recipe(&self, recipe_id: RecipeId, fill: bool) -> Result<Recipe> {
        let key = CacheKey::recipe(recipe_id);

        match get_json::<Recipe>(&*self.cache, &key).await {
            Ok(recipe) => {
                debug!(recipe_id, "recipe cache hit");
                return Ok(recipe);
            }
            Err(err) if err.is_not_found() => debug!(recipe_id, "recipe cache miss"),
            Err(err) => return Err(err.into()),
        }

        let recipe = self
            .recipes
            .get(recipe_id)
            .await?
            .ok_or(ServiceError::RecipeNotFound(recipe_id))?;

        if fill {
            if let Err(err) = set_json(&*self.cache, &key, &recipe).await {
                warn!(recipe_id, "recipe cache set failed: {}", err);
            }
        }

        Ok(recipe)
    }

    /// Resolve the acting user and require it to be `owner_id`
    async fn authorize(&self, login: &str, owner_id: UserId) -> Result<User> {
        let user = self
            .users
            .get_by_login(login)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        if user.id != owner_id {
            return Err(ServiceError::PermissionDenied);
        }

        Ok(user)
    }

    async fn load_owned(&self, login: &str, owner_id: UserId, recipe_id: RecipeId) -> Result<Recipe> {
        let user = self.authorize(login, owner_id).await?;
        let recipe = self.load_recipe(recipe_id, false).await?;

        if recipe.owner_id != user.id {
            return Err(ServiceError::PermissionDenied);
        }

        Ok(recipe)
    }

    async fn invalidate(&self, recipe_id: RecipeId) -> Result<()> {
        let removed = self.cache.del(&CacheKey::recipe(recipe_id)).await?;
        debug!(recipe_id, removed, "recipe cache invalidated");
        Ok(())
    }

    /// Remove photos uploaded for a write that did not persist
    async fn compensate(
        &self,
        operation: &'static str,
        cause: anyhow::Error,
        uploaded: &PhotoUrls,
    ) -> ServiceError {
        let cleanup = self.files.remove(uploaded).await;
        PHOTO_COMPENSATIONS_TOTAL
            .with_label_values(&[operation, outcome(&cleanup)])
            .inc();

        match cleanup {
            Ok(()) => ServiceError::Internal(cause.context(format!("recipe {} failed", operation))),
            Err(cleanup) => {
                warn!(operation, "photo compensation failed: {:#}", cleanup);
                ServiceError::CompensationFailed {
                    operation,
                    cause,
                    cleanup,
                }
            }
        }
    }

    async fn cleanup_photos(&self, operation: &'static str, recipe_id: RecipeId, photos: &PhotoUrls) {
        if photos.is_empty() {
            return;
        }

        let result = self.files.remove(photos).await;
        PHOTO_CLEANUPS_TOTAL
            .with_label_values(&[operation, outcome(&result)])
            .inc();

        if let Err(err) = result {
            warn!(recipe_id, operation, "photo cleanup failed: {:#}", err);
        }
    }

    async fn with_authors(&self, recipes: Vec<Recipe>) -> Result<Vec<RecipeWithAuthor>> {
        try_join_all(recipes.into_iter().map(|recipe| async move {
            let author = self.authors.get_author(recipe.owner_id).await?;
            Ok::<_, ServiceError>(RecipeWithAuthor { recipe, author })
        }))
        .await
    }
}
