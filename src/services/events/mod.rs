//! Notification events and the bus they are published to.

mod memory;
mod redis_stream;

pub use memory::{MemoryEventPublisher, PublishedEvent};
pub use redis_stream::RedisEventPublisher;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{BusBackend, BusConfig};
use crate::error::AppError;
use crate::services::dispatch::ResourceLink;

/// Type discriminator carried by email events and their routing attributes
pub const EMAIL_EVENT_TYPE: &str = "email";

/// Routing attributes attached to a published event
pub type RoutingAttributes = BTreeMap<String, String>;

/// Serializable form of a queued email.
///
/// `content` is the template model when `template_id` is set and the final
/// body text otherwise; the consumer renders templates itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NotificationEvent {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub event_type: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: Timestamp,
    pub provider: String,
    pub to: Vec<String>,
    pub subject: String,
    pub content: Value,
    pub template_id: Option<String>,
    pub is_plain_text: bool,
    pub attachment_ids: Vec<Uuid>,
    pub links: Vec<ResourceLink>,
}

/// The routing attributes every email event is published with.
pub fn email_routing_attributes() -> RoutingAttributes {
    RoutingAttributes::from([("type".to_string(), EMAIL_EVENT_TYPE.to_string())])
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Bus connection error: {0}")]
    Connection(String),

    #[error("Failed to serialize event")]
    Serialization(#[from] serde_json::Error),

    #[error("Bus command failed")]
    Command(#[from] ::redis::RedisError),
}

impl From<PublishError> for AppError {
    fn from(error: PublishError) -> Self {
        AppError::Publish {
            source: error.into(),
        }
    }
}

/// Publishes notification events onto a message bus
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    async fn publish(
        &self,
        event: &NotificationEvent,
        attributes: &RoutingAttributes,
    ) -> Result<(), PublishError>;
}

/// Builds the publisher selected in configuration.
pub async fn from_config(config: &BusConfig) -> Result<Arc<dyn EventPublisher>, PublishError> {
    let publisher: Arc<dyn EventPublisher> = match config.backend {
        BusBackend::Memory => Arc::new(MemoryEventPublisher::new()),
        BusBackend::Redis => Arc::new(RedisEventPublisher::new(&config.redis).await?),
    };
    tracing::info!(backend = publisher.name(), "Event publisher ready");
    Ok(publisher)
}
