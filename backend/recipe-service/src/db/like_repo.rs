use anyhow::Result;
use sqlx::PgPool;

use super::recipe_repo::{into_recipes, RecipeRow};
use super::LikeRegistry;
use crate::models::{Recipe, RecipeId, UserId};

/// Repository for likes. Relies on UNIQUE (user_id, recipe_id).
#[derive(Clone)]
pub struct PgLikeRepository {
    pool: PgPool,
}

impl PgLikeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl LikeRegistry for PgLikeRepository {
    async fn is_liked(&self, user_id: UserId, recipe_id: RecipeId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM likes
                WHERE user_id = $1 AND recipe_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(recipe_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn likes_count(&self, recipe_id: RecipeId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE recipe_id = $1")
            .bind(recipe_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn like(&self, user_id: UserId, recipe_id: RecipeId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO likes (user_id, recipe_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, recipe_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(recipe_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn unlike(&self, user_id: UserId, recipe_id: RecipeId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND recipe_id = $2")
            .bind(user_id)
            .bind(recipe_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn liked_recipes(&self, user_id: UserId) -> Result<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, RecipeRow>(
            r#"
            SELECT r.id, r.user_id, r.title, r.about, r.complexity, r.need_time,
                   r.ingredients, r.instructions, r.photos_urls, r.created_at, r.updated_at
            FROM recipes r
            JOIN likes l ON l.recipe_id = r.id
            WHERE l.user_id = $1
            ORDER BY r.updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        into_recipes(rows)
    }
}
