//! Redis stream event publisher using a bb8 connection pool.

use std::time::Duration;

use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use redis::Client;
use redis::aio::MultiplexedConnection;

use super::{EventPublisher, NotificationEvent, PublishError, RoutingAttributes};
use crate::config::RedisBusConfig;

type RedisPool = Pool<Client>;

/// Appends events to a Redis stream with `XADD ... MAXLEN ~`.
///
/// Each entry carries `event_id`, the JSON `payload`, and one field per
/// routing attribute so consumers can filter without decoding the payload.
pub struct RedisEventPublisher {
    pool: RedisPool,
    stream: String,
    max_len: u64,
}

impl RedisEventPublisher {
    pub async fn new(config: &RedisBusConfig) -> Result<Self, PublishError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| PublishError::Connection(e.to_string()))?;

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(Duration::from_secs(config.connection_timeout))
            .build(client)
            .await
            .map_err(|e| PublishError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            stream: config.stream.clone(),
            max_len: config.max_len,
        })
    }

    async fn get_conn(&self) -> Result<PooledConnection<'_, Client>, PublishError> {
        self.pool
            .get()
            .await
            .map_err(|e| PublishError::Connection(e.to_string()))
    }
}

/// Field/value pairs written for one stream entry.
fn stream_fields(
    event: &NotificationEvent,
    attributes: &RoutingAttributes,
) -> Result<Vec<(String, String)>, PublishError> {
    let mut fields = Vec::with_capacity(attributes.len() + 2);
    fields.push(("event_id".to_string(), event.id.to_string()));
    fields.push(("payload".to_string(), serde_json::to_string(event)?));
    fields.extend(
        attributes
            .iter()
            .filter(|(key, _)| key.as_str() != "event_id" && key.as_str() != "payload")
            .map(|(key, value)| (key.clone(), value.clone())),
    );
    Ok(fields)
}

#[async_trait]
impl EventPublisher for RedisEventPublisher {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn publish(
        &self,
        event: &NotificationEvent,
        attributes: &RoutingAttributes,
    ) -> Result<(), PublishError> {
        let fields = stream_fields(event, attributes)?;

        let mut cmd = redis::cmd("XADD");
        cmd.arg(&self.stream).arg("MAXLEN").arg("~").arg(self.max_len).arg("*");
        for (field, value) in &fields {
            cmd.arg(field).arg(value);
        }

        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;
        let conn_ref: &mut MultiplexedConnection = &mut conn;
        let entry_id: String = cmd.query_async(conn_ref).await?;

        tracing::info!(
            event_id = %event.id,
            stream = %self.stream,
            entry_id = %entry_id,
            "Notification event appended to stream"
        );
        Ok(())
    }
}
