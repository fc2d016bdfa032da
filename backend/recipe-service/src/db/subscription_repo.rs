use anyhow::Result;
use sqlx::PgPool;

use super::SubscriptionStore;
use crate::models::{Subscription, UserId};

/// Repository for creator subscriptions. Relies on UNIQUE (creator_id, subscriber_id).
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SubscriptionStore for PgSubscriptionRepository {
    async fn exists(&self, subscription: Subscription) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM subscriptions
                WHERE creator_id = $1 AND subscriber_id = $2
            )
            "#,
        )
        .bind(subscription.creator_id)
        .bind(subscription.subscriber_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert(&self, subscription: Subscription) -> Result<bool> {
        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO subscriptions (creator_id, subscriber_id)
            VALUES ($1, $2)
            ON CONFLICT (creator_id, subscriber_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(subscription.creator_id)
        .bind(subscription.subscriber_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inserted.is_some())
    }

    async fn delete(&self, subscription: Subscription) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM subscriptions WHERE creator_id = $1 AND subscriber_id = $2",
        )
        .bind(subscription.creator_id)
        .bind(subscription.subscriber_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn subscribers(&self, creator_id: UserId) -> Result<Vec<UserId>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT subscriber_id FROM subscriptions WHERE creator_id = $1 ORDER BY subscriber_id",
        )
        .bind(creator_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}
