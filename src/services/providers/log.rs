//! Provider that writes each message to the log instead of delivering it.

use async_trait::async_trait;
use uuid::Uuid;

use super::{EmailProvider, MessageBody, OutboundMessage, SendReceipt, provider_error};
use crate::error::AppResult;
use crate::services::storage::read_all;

/// Logs a structured line per message and drains its attachments.
///
/// Useful for local development and as the default provider.
#[derive(Debug, Clone)]
pub struct LogProvider {
    name: String,
    native_templating: bool,
}

impl LogProvider {
    pub fn new(name: impl Into<String>, native_templating: bool) -> Self {
        Self {
            name: name.into(),
            native_templating,
        }
    }
}

#[async_trait]
impl EmailProvider for LogProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_native_templating(&self) -> bool {
        self.native_templating
    }

    async fn send(&self, message: OutboundMessage) -> AppResult<SendReceipt> {
        let mut attachment_bytes = 0usize;
        for attachment in message.attachments {
            let bytes = read_all(attachment.content)
                .await
                .map_err(|e| provider_error(&self.name, e))?;
            attachment_bytes += bytes.len();
        }

        let message_id = Uuid::new_v4().to_string();
        match &message.body {
            MessageBody::Rendered { content, kind } => tracing::info!(
                provider = %self.name,
                message_id = %message_id,
                to = ?message.to,
                subject = %message.subject,
                content_type = kind.mime_type(),
                content_length = content.len(),
                attachment_bytes,
                "Email logged"
            ),
            MessageBody::Template { template_id, model } => tracing::info!(
                provider = %self.name,
                message_id = %message_id,
                to = ?message.to,
                subject = %message.subject,
                template_id = %template_id,
                model = %model,
                attachment_bytes,
                "Templated email logged"
            ),
        }

        Ok(SendReceipt::new(
            self.name.clone(),
            Some(message_id),
            message.to.len(),
        ))
    }
}
