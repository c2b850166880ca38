//! Webhook email provider implementation.
//!
//! Sends the resolved message as JSON to a configured URL using the global
//! `HTTP_CLIENT`; the receiving service performs the actual delivery.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;

use super::{
    EmailProvider, EncodedAttachment, MessageBody, OutboundMessage, SendReceipt, provider_error,
};
use crate::config::WebhookSettings;
use crate::error::AppResult;
use crate::external::HTTP_CLIENT;

/// Webhook provider
///
/// # Example
/// ```ignore
/// let settings = WebhookSettings {
///     url: "https://mailer.internal/send".to_string(),
///     method: "POST".to_string(),
///     headers: BTreeMap::new(),
///     timeout_seconds: 30,
/// };
/// let provider = WebhookProvider::new("mailer", settings, false);
/// let receipt = provider.send(message).await?;
/// ```
pub struct WebhookProvider {
    name: String,
    settings: WebhookSettings,
    native_templating: bool,
}

impl WebhookProvider {
    pub fn new(
        name: impl Into<String>,
        settings: WebhookSettings,
        native_templating: bool,
    ) -> Self {
        Self {
            name: name.into(),
            settings,
            native_templating,
        }
    }

    fn method(&self) -> Method {
        self.settings
            .method
            .to_uppercase()
            .parse()
            .unwrap_or(Method::POST)
    }

    fn build_request_body(
        &self,
        to: &[String],
        subject: &str,
        body: &MessageBody,
        attachments: &[EncodedAttachment],
    ) -> serde_json::Value {
        let mut payload = json!({
            "provider": self.name,
            "to": to,
            "subject": subject,
            "attachments": attachments,
        });

        match body {
            MessageBody::Rendered { content, kind } => {
                payload["content"] = json!(content);
                payload["content_type"] = json!(kind.mime_type());
            }
            MessageBody::Template { template_id, model } => {
                payload["template_id"] = json!(template_id);
                payload["model"] = model.clone();
            }
        }

        payload
    }
}

#[async_trait]
impl EmailProvider for WebhookProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_native_templating(&self) -> bool {
        self.native_templating
    }

    async fn send(&self, message: OutboundMessage) -> AppResult<SendReceipt> {
        let start = Instant::now();
        let attachments = OutboundMessage::encode_attachments(message.attachments)
            .await
            .map_err(|e| provider_error(&self.name, e))?;
        let body =
            self.build_request_body(&message.to, &message.subject, &message.body, &attachments);

        let mut request = HTTP_CLIENT
            .request(self.method(), &self.settings.url)
            .timeout(Duration::from_secs(self.settings.timeout_seconds))
            .json(&body);
        for (key, value) in &self.settings.headers {
            request = request.header(key, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| provider_error(&self.name, e))?;
        let status = response.status();
        let duration_ms = start.elapsed().as_millis() as u64;

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::warn!(
                provider = %self.name,
                status = status.as_u16(),
                duration_ms,
                "Webhook rejected email"
            );
            return Err(provider_error(
                &self.name,
                anyhow::anyhow!("webhook returned {}: {}", status, error_body),
            ));
        }

        tracing::debug!(
            provider = %self.name,
            status = status.as_u16(),
            duration_ms,
            "Webhook accepted email"
        );

        let message_id = response
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(SendReceipt::new(self.name.clone(), message_id, message.to.len()))
    }
}
