use anyhow::{Context, Result};
use sqlx::PgPool;

use super::CommentRegistry;
use crate::models::{Comment, CommentId, RecipeId, UserId};

#[derive(Clone)]
pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CommentRegistry for PgCommentRepository {
    async fn list(&self, recipe_id: RecipeId) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, user_id, recipe_id, text, created_at, updated_at
            FROM comments
            WHERE recipe_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("failed to load comments of recipe {}", recipe_id))?;

        Ok(comments)
    }

    async fn get(&self, id: CommentId) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, user_id, recipe_id, text, created_at, updated_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn create(&self, user_id: UserId, recipe_id: RecipeId, text: &str) -> Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (user_id, recipe_id, text)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, recipe_id, text, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(recipe_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert comment")?;

        Ok(comment)
    }

    async fn update_text(&self, id: CommentId, text: &str) -> Result<()> {
        sqlx::query("UPDATE comments SET text = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(text)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to update comment {}", id))?;

        Ok(())
    }

    async fn delete(&self, id: CommentId) -> Result<()> {
        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete comment {}", id))?;

        Ok(())
    }
}
