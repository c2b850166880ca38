//! Core email provider trait and message types.
//!
//! This module provides the abstraction for email providers, allowing the
//! dispatch pipeline to hand a fully resolved message to any configured
//! backend by name.

mod log;
mod registry;
mod sendgrid;
mod webhook;

pub use log::LogProvider;
pub use registry::ProviderRegistry;
pub use sendgrid::SendGridProvider;
pub use webhook::WebhookProvider;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use jiff::Timestamp;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::services::storage::{BlobStream, read_all};

/// Whether rendered content is plain text or HTML
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Plain,
    Html,
}

impl ContentKind {
    pub fn from_plain_text_flag(is_plain_text: bool) -> Self {
        if is_plain_text {
            ContentKind::Plain
        } else {
            ContentKind::Html
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ContentKind::Plain => "text/plain",
            ContentKind::Html => "text/html",
        }
    }
}

/// Message body handed to a provider
#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    /// Final content, already rendered
    Rendered { content: String, kind: ContentKind },
    /// Raw template reference for providers that render templates themselves
    Template { template_id: String, model: Value },
}

/// An attachment resolved to an owned byte stream
pub struct OutboundAttachment {
    pub name: String,
    pub content_type: String,
    pub content: BlobStream,
}

impl std::fmt::Debug for OutboundAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundAttachment")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Fully resolved email, consumed by [`EmailProvider::send`]
#[derive(Debug)]
pub struct OutboundMessage {
    pub provider: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: MessageBody,
    pub attachments: Vec<OutboundAttachment>,
}

/// Attachment with its bytes base64 encoded, as JSON APIs expect
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedAttachment {
    pub name: String,
    pub content_type: String,
    pub content: String,
    pub size: usize,
}

impl OutboundMessage {
    /// Drains every attachment stream and base64 encodes its contents.
    pub async fn encode_attachments(
        attachments: Vec<OutboundAttachment>,
    ) -> std::io::Result<Vec<EncodedAttachment>> {
        let mut encoded = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            let bytes = read_all(attachment.content).await?;
            encoded.push(EncodedAttachment {
                name: attachment.name,
                content_type: attachment.content_type,
                size: bytes.len(),
                content: BASE64.encode(&bytes),
            });
        }
        Ok(encoded)
    }
}

/// Outcome of a successful synchronous send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SendReceipt {
    /// Provider that accepted the message
    pub provider: String,
    /// Provider-assigned message id, when the provider returns one
    pub message_id: Option<String>,
    /// Number of recipients the message was addressed to
    pub recipients: usize,
    #[schema(value_type = String, format = DateTime)]
    pub accepted_at: Timestamp,
}

impl SendReceipt {
    pub fn new(provider: impl Into<String>, message_id: Option<String>, recipients: usize) -> Self {
        Self {
            provider: provider.into(),
            message_id,
            recipients,
            accepted_at: Timestamp::now(),
        }
    }
}

/// Trait for email providers
///
/// Uses `async_trait` to support async methods with dynamic dispatch.
/// All providers must be Send + Sync so the registry can be shared across
/// request handlers.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Registry name this provider was configured under
    fn name(&self) -> &str;

    /// Whether the provider can render a [`MessageBody::Template`] itself
    fn supports_native_templating(&self) -> bool {
        false
    }

    /// Sends the message, consuming its attachment streams.
    async fn send(&self, message: OutboundMessage) -> AppResult<SendReceipt>;
}

/// Wraps a failure inside a provider into [`AppError::Provider`].
pub(crate) fn provider_error(provider: &str, source: impl Into<anyhow::Error>) -> AppError {
    AppError::Provider {
        provider: provider.to_string(),
        source: source.into(),
    }
}
