//! Email DTOs for API requests and responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::extract::FormPart;
use crate::error::{AppError, AppResult, ValidationFieldError};
use crate::services::attachments::FileUpload;
use crate::services::dispatch::{
    AttachmentSource, NotificationBody, NotificationRequest, ResourceLink,
};

// ============================================================================
// Multipart (synchronous) requests
// ============================================================================

/// Multipart body accepted by the synchronous email endpoints (documentation only)
#[derive(Debug, ToSchema)]
pub struct EmailFormSchema {
    /// Recipient addresses; repeat the field or separate with commas
    pub to: Vec<String>,
    pub subject: String,
    /// Body content, required unless a template is used
    pub content: Option<String>,
    /// Send `content` as plain text instead of HTML
    pub is_plain_text: Option<bool>,
    /// Provider name; the configured default is used when omitted
    pub provider: Option<String>,
    /// JSON array of `{ "name", "link" }` objects appended to the body
    #[schema(example = r#"[{"name":"Docs","link":"https://docs.example.com"}]"#)]
    pub links: Option<String>,
    /// JSON model for template substitution (template endpoint only; alias `template_content`)
    #[schema(example = r#"{"name":"Ada"}"#)]
    pub model: Option<String>,
    /// Files to attach
    #[schema(value_type = Vec<String>, format = Binary)]
    pub files: Vec<Vec<u8>>,
}

/// Fields of a multipart email form, parsed but not yet validated.
#[derive(Debug, Default)]
pub struct EmailForm {
    pub to: Vec<String>,
    pub subject: String,
    pub content: String,
    pub is_plain_text: bool,
    pub provider: Option<String>,
    pub links: Vec<ResourceLink>,
    pub model: Option<Value>,
    pub attachments: Vec<FileUpload>,
}

impl EmailForm {
    /// Parses form parts, reporting every malformed field at once.
    pub fn from_parts(parts: Vec<FormPart>) -> AppResult<Self> {
        let mut form = EmailForm::default();
        let mut errors = Vec::new();

        for part in parts {
            let (name, value) = match part {
                FormPart::File(file) => {
                    form.attachments.push(file);
                    continue;
                }
                FormPart::Text { name, value } => (name, value),
            };

            match name.as_str() {
                "to" => form.to.extend(split_recipients(&value)),
                "subject" => form.subject = value,
                "content" => form.content = value,
                "provider" => form.provider = Some(value),
                "is_plain_text" => match parse_flag(&value) {
                    Some(flag) => form.is_plain_text = flag,
                    None => errors.push(ValidationFieldError::new(
                        "is_plain_text",
                        format!("'{}' is not a boolean", value),
                    )),
                },
                "links" if value.trim().is_empty() => {}
                "links" => match serde_json::from_str::<Vec<ResourceLink>>(&value) {
                    Ok(links) => form.links.extend(links),
                    Err(e) => errors.push(ValidationFieldError::new(
                        "links",
                        format!("links must be a JSON array of {{name, link}}: {}", e),
                    )),
                },
                "model" | "template_content" if value.trim().is_empty() => {}
                "model" | "template_content" => match serde_json::from_str::<Value>(&value) {
                    Ok(model) => form.model = Some(model),
                    Err(e) => errors.push(ValidationFieldError::new(
                        name.clone(),
                        format!("{} must be valid JSON: {}", name, e),
                    )),
                },
                other => tracing::debug!(field = other, "Ignoring unknown form field"),
            }
        }

        match AppError::from_field_errors(errors) {
            Some(err) => Err(err),
            None => Ok(form),
        }
    }

    /// A request sending `content` as the body.
    pub fn into_request(self) -> NotificationRequest {
        let body = NotificationBody::Text(self.content.clone());
        self.into_request_with(body)
    }

    /// A request rendering template `template_id` with the form's model.
    pub fn into_template_request(self, template_id: String) -> NotificationRequest {
        let model = self
            .model
            .clone()
            .unwrap_or_else(|| Value::Object(Default::default()));
        self.into_request_with(NotificationBody::Template { template_id, model })
    }

    fn into_request_with(self, body: NotificationBody) -> NotificationRequest {
        NotificationRequest {
            to: self.to,
            subject: self.subject,
            body,
            attachments: self
                .attachments
                .into_iter()
                .map(AttachmentSource::Inline)
                .collect(),
            links: self.links,
            provider: self.provider,
            is_plain_text: self.is_plain_text,
        }
    }
}

fn split_recipients(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split([',', ';'])
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(String::from)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "0" | "off" | "no" => Some(false),
        "true" | "1" | "on" | "yes" => Some(true),
        _ => None,
    }
}

// ============================================================================
// JSON (queued) requests
// ============================================================================

/// Request to queue an email for asynchronous delivery.
///
/// Attachments must be uploaded first and referenced by id.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[schema(example = json!({
    "to": ["ada@example.com"],
    "subject": "Your report",
    "content": "<p>The report is attached.</p>",
    "attachment_ids": ["0b7e6a8e-2f0c-4a47-9d7b-7a1c2f1c3d4e"],
    "links": [{ "name": "Dashboard", "link": "https://example.com/dashboard" }]
}))]
pub struct QueueEmailRequest {
    #[serde(default)]
    pub to: Vec<String>,
    #[serde(default)]
    pub subject: String,
    /// Body content, required unless `template_id` is set
    #[serde(default)]
    pub content: Option<String>,
    /// Template rendered by the consumer of the event
    #[serde(default)]
    pub template_id: Option<String>,
    /// Template model
    #[serde(default, alias = "template_content")]
    pub model: Option<Value>,
    #[serde(default)]
    pub is_plain_text: bool,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub attachment_ids: Vec<Uuid>,
    #[serde(default)]
    pub links: Vec<ResourceLink>,
}

impl From<QueueEmailRequest> for NotificationRequest {
    fn from(request: QueueEmailRequest) -> Self {
        let body = match request.template_id {
            Some(template_id) => NotificationBody::Template {
                template_id,
                model: request
                    .model
                    .unwrap_or_else(|| Value::Object(Default::default())),
            },
            None => NotificationBody::Text(request.content.unwrap_or_default()),
        };

        NotificationRequest {
            to: request.to,
            subject: request.subject,
            body,
            attachments: request
                .attachment_ids
                .into_iter()
                .map(AttachmentSource::Stored)
                .collect(),
            links: request.links,
            provider: request.provider,
            is_plain_text: request.is_plain_text,
        }
    }
}

/// Response for an accepted queued email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EmailQueuedResponse {
    /// Id of the published event
    pub event_id: Uuid,
}
