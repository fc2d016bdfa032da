use anyhow::{Context, Result};
use sqlx::PgPool;

use super::UserStore;
use crate::models::{Author, User, UserId};

/// Read-only view of the users table. Accounts are owned by the auth side.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserStore for PgUserRepository {
    async fn get_by_login(&self, login: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, login, email, icon_url, about, created_at
            FROM users
            WHERE login = $1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to load user {}", login))?;

        Ok(user)
    }

    async fn get_author(&self, id: UserId) -> Result<Option<Author>> {
        let author = sqlx::query_as::<_, Author>("SELECT login, icon_url FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to load author {}", id))?;

        Ok(author)
    }
}
