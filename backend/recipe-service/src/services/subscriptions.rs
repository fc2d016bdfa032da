use std::sync::Arc;
use tracing::{error, info};

use crate::db::{SubscriptionStore, UserStore};
use crate::error::{Result, ServiceError};
use crate::kafka::NotificationPublisher;
use crate::metrics::{outcome, RECIPE_EVENTS_PUBLISHED_TOTAL};
use crate::models::{RecipeCreatedEvent, RecipeId, Subscription, UserId};

/// Creator subscriptions and the new-recipe announcement that feeds them.
///
/// Fan-out to individual subscribers is done by the queue consumer, which
/// reads the subscriber list through [`SubscriptionService::subscribers`].
pub struct SubscriptionService {
    users: Arc<dyn UserStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    publisher: Arc<dyn NotificationPublisher>,
}

impl SubscriptionService {
    pub fn new(
        users: Arc<dyn UserStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        publisher: Arc<dyn NotificationPublisher>,
    ) -> Self {
        Self {
            users,
            subscriptions,
            publisher,
        }
    }

    pub async fn subscribe(&self, creator_login: &str, subscriber_id: UserId) -> Result<()> {
        let creator_id = self.creator_id(creator_login).await?;
        if creator_id == subscriber_id {
            return Err(ServiceError::YourselfSubscribe);
        }

        let subscription = Subscription {
            creator_id,
            subscriber_id,
        };
        if self.subscriptions.exists(subscription).await?
            || !self.subscriptions.insert(subscription).await?
        {
            return Err(ServiceError::AlreadySubscribed);
        }

        info!(creator_id, subscriber_id, "subscribed");
        Ok(())
    }

    pub async fn unsubscribe(&self, creator_login: &str, subscriber_id: UserId) -> Result<()> {
        let creator_id = self.creator_id(creator_login).await?;
        if creator_id == subscriber_id {
            return Err(ServiceError::YourselfUnsubscribe);
        }

        let subscription = Subscription {
            creator_id,
            subscriber_id,
        };
        if !self.subscriptions.exists(subscription).await?
            || !self.subscriptions.delete(subscription).await?
        {
            return Err(ServiceError::AlreadyUnsubscribed);
        }

        info!(creator_id, subscriber_id, "unsubscribed");
        Ok(())
    }

    pub async fn subscribers(&self, creator_id: UserId) -> Result<Vec<UserId>> {
        Ok(self.subscriptions.subscribers(creator_id).await?)
    }

    /// Announce a freshly persisted recipe. A single attempt, no retry.
    pub async fn notify_new_recipe(&self, creator_id: UserId, recipe_id: RecipeId) -> Result<()> {
        let event = RecipeCreatedEvent {
            creator_id,
            recipe_id,
        };

        let result = self.publisher.send(&event).await;
        RECIPE_EVENTS_PUBLISHED_TOTAL
            .with_label_values(&[outcome(&result)])
            .inc();

        result.map_err(|source| {
            error!(recipe_id, creator_id, "new recipe notification failed: {:#}", source);
            ServiceError::NotificationPublish { recipe_id, source }
        })
    }

    async fn creator_id(&self, login: &str) -> Result<UserId> {
        self.users
            .get_by_login(login)
            .await?
            .map(|user| user.id)
            .ok_or(ServiceError::UserNotFound)
    }
}
