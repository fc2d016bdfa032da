use std::sync::Arc;
use tracing::debug;

use crate::db::{LikeRegistry, RecipeStore};
use crate::error::{Result, ServiceError};
use crate::models::{Recipe, RecipeId, UserId};

/// Likes on recipes. Uncached.
///
/// The existence check before each write is advisory; two identical
/// concurrent requests are resolved by the store's uniqueness constraint and
/// the loser gets the same error as a sequential duplicate.
pub struct LikeService {
    recipes: Arc<dyn RecipeStore>,
    likes: Arc<dyn LikeRegistry>,
}

impl LikeService {
    pub fn new(recipes: Arc<dyn RecipeStore>, likes: Arc<dyn LikeRegistry>) -> Self {
        Self { recipes, likes }
    }

    pub async fn like(&self, user_id: UserId, recipe_id: RecipeId) -> Result<()> {
        self.ensure_recipe(recipe_id).await?;

        if self.likes.is_liked(user_id, recipe_id).await? {
            return Err(ServiceError::AlreadyLiked);
        }
        if !self.likes.like(user_id, recipe_id).await? {
            debug!(user_id, recipe_id, "lost like race");
            return Err(ServiceError::AlreadyLiked);
        }

        Ok(())
    }

    pub async fn unlike(&self, user_id: UserId, recipe_id: RecipeId) -> Result<()> {
        self.ensure_recipe(recipe_id).await?;

        if !self.likes.is_liked(user_id, recipe_id).await? {
            return Err(ServiceError::NotLikedYet);
        }
        if !self.likes.unlike(user_id, recipe_id).await? {
            debug!(user_id, recipe_id, "lost unlike race");
            return Err(ServiceError::NotLikedYet);
        }

        Ok(())
    }

    pub async fn likes_count(&self, recipe_id: RecipeId) -> Result<i64> {
        Ok(self.likes.likes_count(recipe_id).await?)
    }

    /// Recipes the user has liked
    pub async fn liked_recipes(&self, user_id: UserId) -> Result<Vec<Recipe>> {
        Ok(self.likes.liked_recipes(user_id).await?)
    }

    async fn ensure_recipe(&self, recipe_id: RecipeId) -> Result<()> {
        if self.recipes.exists(recipe_id).await? {
            Ok(())
        } else {
            Err(ServiceError::RecipeNotFound(recipe_id))
        }
    }
}
