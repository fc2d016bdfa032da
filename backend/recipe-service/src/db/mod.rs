/// Durable store access layer
///
/// The traits are the seams the services are built against. The Postgres
/// repositories below implement them; tests substitute in-memory fakes.
use anyhow::Result;

use crate::models::{
    Author, Comment, CommentId, Recipe, RecipeDraft, RecipeId, RecipeQuery, Subscription, User,
    UserId,
};

pub mod comment_repo;
pub mod like_repo;
pub mod recipe_repo;
pub mod subscription_repo;
pub mod user_repo;

pub use comment_repo::PgCommentRepository;
pub use like_repo::PgLikeRepository;
pub use recipe_repo::PgRecipeRepository;
pub use subscription_repo::PgSubscriptionRepository;
pub use user_repo::PgUserRepository;

#[async_trait::async_trait]
pub trait RecipeStore: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Recipe>>;

    async fn get_filtered(&self, query: &RecipeQuery) -> Result<Vec<Recipe>>;

    async fn get(&self, id: RecipeId) -> Result<Option<Recipe>>;

    async fn exists(&self, id: RecipeId) -> Result<bool> {
        Ok(self.get(id).await?.is_some())
    }

    /// Insert a recipe and return its generated id
    async fn create(&self, draft: &RecipeDraft) -> Result<RecipeId>;

    /// Overwrite every mutable column; `updated_at` is set by the store
    async fn update(&self, recipe: &Recipe) -> Result<()>;

    async fn delete(&self, id: RecipeId) -> Result<()>;
}

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn get_by_login(&self, login: &str) -> Result<Option<User>>;

    async fn get_author(&self, id: UserId) -> Result<Option<Author>>;
}

/// Likes are keyed by (user, recipe). The store must enforce uniqueness of
/// that pair; `like` reports whether a row was actually inserted.
#[async_trait::async_trait]
pub trait LikeRegistry: Send + Sync {
    async fn is_liked(&self, user_id: UserId, recipe_id: RecipeId) -> Result<bool>;

    async fn likes_count(&self, recipe_id: RecipeId) -> Result<i64>;

    async fn like(&self, user_id: UserId, recipe_id: RecipeId) -> Result<bool>;

    async fn unlike(&self, user_id: UserId, recipe_id: RecipeId) -> Result<bool>;

    async fn liked_recipes(&self, user_id: UserId) -> Result<Vec<Recipe>>;
}

#[async_trait::async_trait]
pub trait CommentRegistry: Send + Sync {
    /// Comments of a recipe, oldest first
    async fn list(&self, recipe_id: RecipeId) -> Result<Vec<Comment>>;

    async fn get(&self, id: CommentId) -> Result<Option<Comment>>;

    async fn create(&self, user_id: UserId, recipe_id: RecipeId, text: &str) -> Result<Comment>;

    async fn update_text(&self, id: CommentId, text: &str) -> Result<()>;

    async fn delete(&self, id: CommentId) -> Result<()>;
}

/// Subscriptions are unique per (creator, subscriber)
#[async_trait::async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn exists(&self, subscription: Subscription) -> Result<bool>;

    /// Returns false when the pair already existed
    async fn insert(&self, subscription: Subscription) -> Result<bool>;

    /// Returns false when there was nothing to delete
    async fn delete(&self, subscription: Subscription) -> Result<bool>;

    async fn subscribers(&self, creator_id: UserId) -> Result<Vec<UserId>>;
}
