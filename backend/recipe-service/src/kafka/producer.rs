use anyhow::Result;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use std::time::Duration;
use tracing::{info, warn};

use super::NotificationPublisher;
use crate::config::KafkaConfig;
use crate::models::RecipeCreatedEvent;

/// Configuration for the Kafka notification producer
#[derive(Debug, Clone)]
pub struct KafkaPublisherConfig {
    pub brokers: String,
    pub topic: String,
    pub request_timeout: Duration,
}

impl From<&KafkaConfig> for KafkaPublisherConfig {
    fn from(config: &KafkaConfig) -> Self {
        Self {
            brokers: config.brokers.join(","),
            topic: config.new_recipe_topic.clone(),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
        }
    }
}

/// Publishes `RecipeCreatedEvent`s, keyed by creator so one creator's
/// announcements stay ordered within a partition
#[derive(Clone)]
pub struct KafkaNotificationPublisher {
    producer: FutureProducer,
    topic: String,
    request_timeout: Duration,
}

impl KafkaNotificationPublisher {
    pub fn new(config: &KafkaPublisherConfig) -> Result<Self> {
        let producer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("client.id", "recipe-service")
            .set("enable.idempotence", "true")
            .set("acks", "all")
            .set("max.in.flight.requests.per.connection", "5")
            .set("retries", "3")
            .set("linger.ms", "5")
            .create::<FutureProducer>()?;

        info!(
            brokers = %config.brokers,
            topic = %config.topic,
            "Recipe notification Kafka producer initialized"
        );

        Ok(Self {
            producer,
            topic: config.topic.clone(),
            request_timeout: config.request_timeout,
        })
    }
}

#[async_trait::async_trait]
impl NotificationPublisher for KafkaNotificationPublisher {
    async fn send(&self, event: &RecipeCreatedEvent) -> Result<()> {
        let payload = serde_json::to_string(event)?;
        let partition_key = event.creator_id.to_string();

        let record = FutureRecord::to(&self.topic)
            .key(&partition_key)
            .payload(&payload);

        match self.producer.send(record, self.request_timeout).await {
            Ok(_) => {
                info!(
                    recipe_id = event.recipe_id,
                    creator_id = event.creator_id,
                    topic = %self.topic,
                    "Published new recipe event to Kafka"
                );
                Ok(())
            }
            Err((err, _)) => {
                warn!(
                    error = ?err,
                    recipe_id = event.recipe_id,
                    "Failed to publish new recipe event to Kafka"
                );
                Err(anyhow::anyhow!("Failed to publish new recipe event: {}", err))
            }
        }
    }
}
