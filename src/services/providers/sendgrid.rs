//! SendGrid email provider.
//!
//! Sends email through the SendGrid v3 `mail/send` API using the global
//! `HTTP_CLIENT`. Each recipient gets its own personalization so recipients
//! never see each other's addresses.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::{
    EmailProvider, EncodedAttachment, MessageBody, OutboundMessage, SendReceipt, provider_error,
};
use crate::config::SendGridSettings;
use crate::error::AppResult;
use crate::external::HTTP_CLIENT;

#[derive(Debug, Serialize)]
struct SendGridRequest {
    personalizations: Vec<Personalization>,
    from: EmailAddress,
    subject: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    content: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    template_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<Attachment>,
}

#[derive(Debug, Serialize)]
struct Personalization {
    to: Vec<EmailAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dynamic_template_data: Option<Value>,
}

#[derive(Debug, Serialize)]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(rename = "type")]
    content_type: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct Attachment {
    content: String,
    filename: String,
    #[serde(rename = "type")]
    content_type: String,
    disposition: &'static str,
}

/// SendGrid v3 provider
pub struct SendGridProvider {
    name: String,
    settings: SendGridSettings,
    native_templating: bool,
}

impl SendGridProvider {
    pub fn new(
        name: impl Into<String>,
        settings: SendGridSettings,
        native_templating: bool,
    ) -> Self {
        Self {
            name: name.into(),
            settings,
            native_templating,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/mail/send", self.settings.api_url.trim_end_matches('/'))
    }

    fn build_request(
        &self,
        to: &[String],
        subject: &str,
        body: MessageBody,
        attachments: Vec<EncodedAttachment>,
    ) -> SendGridRequest {
        let (content, template_id, template_data) = match body {
            MessageBody::Rendered { content, kind } => (
                vec![Content {
                    content_type: kind.mime_type().to_string(),
                    value: content,
                }],
                None,
                None,
            ),
            MessageBody::Template { template_id, model } => {
                (Vec::new(), Some(template_id), Some(model))
            }
        };

        let personalizations = to
            .iter()
            .map(|recipient| Personalization {
                to: vec![EmailAddress {
                    email: recipient.clone(),
                    name: None,
                }],
                // Dynamic templates ignore the top-level subject.
                subject: template_data.as_ref().map(|_| subject.to_string()),
                dynamic_template_data: template_data.clone(),
            })
            .collect();

        SendGridRequest {
            personalizations,
            from: EmailAddress {
                email: self.settings.from_email.clone(),
                name: self.settings.from_name.clone(),
            },
            subject: subject.to_string(),
            content,
            template_id,
            attachments: attachments
                .into_iter()
                .map(|a| Attachment {
                    content: a.content,
                    filename: a.name,
                    content_type: a.content_type,
                    disposition: "attachment",
                })
                .collect(),
        }
    }
}

#[async_trait]
impl EmailProvider for SendGridProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_native_templating(&self) -> bool {
        self.native_templating
    }

    async fn send(&self, message: OutboundMessage) -> AppResult<SendReceipt> {
        let attachments = OutboundMessage::encode_attachments(message.attachments)
            .await
            .map_err(|e| provider_error(&self.name, e))?;
        let recipients = message.to.len();
        let request = self.build_request(&message.to, &message.subject, message.body, attachments);

        tracing::debug!(
            provider = %self.name,
            recipients,
            subject = %message.subject,
            "Sending email via SendGrid"
        );

        let response = HTTP_CLIENT
            .post(self.endpoint())
            .bearer_auth(&self.settings.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| provider_error(&self.name, e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::error!(
                provider = %self.name,
                status = %status,
                error = %error_body,
                "SendGrid API error"
            );
            let reason = match status.as_u16() {
                429 => "rate limit exceeded".to_string(),
                401 | 403 => "authentication failed".to_string(),
                _ => format!("SendGrid error ({}): {}", status, error_body),
            };
            return Err(provider_error(&self.name, anyhow::anyhow!(reason)));
        }

        let message_id = response
            .headers()
            .get("X-Message-Id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(SendReceipt::new(self.name.clone(), message_id, recipients))
    }
}
