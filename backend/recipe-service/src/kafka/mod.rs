//! New-recipe notifications
//!
//! A single message per created recipe. Fan-out to subscribers happens in an
//! external consumer that reads `RecipeCreatedEvent` off the topic.

use anyhow::Result;

use crate::models::RecipeCreatedEvent;

pub mod producer;

pub use producer::{KafkaNotificationPublisher, KafkaPublisherConfig};

/// Durable queue producer. Delivery guarantees stop at broker acceptance.
#[async_trait::async_trait]
pub trait NotificationPublisher: Send + Sync {
    async fn send(&self, event: &RecipeCreatedEvent) -> Result<()>;
}
