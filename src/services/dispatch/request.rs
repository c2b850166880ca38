//! Inbound notification request model.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidateEmail, ValidationError};

use crate::services::attachments::FileUpload;
use crate::services::providers::ContentKind;

/// A named link appended to the email body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ResourceLink {
    /// Text shown for the link
    pub name: String,
    /// Target URL
    pub link: String,
}

impl ResourceLink {
    fn render(&self, kind: ContentKind) -> String {
        match kind {
            ContentKind::Plain => format!("\n{}: {}", self.name, self.link),
            ContentKind::Html => format!("<br><a href='{}'>{}</a>", self.link, self.name),
        }
    }
}

/// Appends every link to `content` in the style matching `kind`.
pub fn append_links(content: String, links: &[ResourceLink], kind: ContentKind) -> String {
    links.iter().fold(content, |mut acc, link| {
        acc.push_str(&link.render(kind));
        acc
    })
}

/// Where the body of a notification comes from
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationBody {
    /// Content supplied by the caller
    Text(String),
    /// Content derived from a stored template and a model
    Template { template_id: String, model: Value },
}

/// An attachment as referenced by a request
#[derive(Debug, Clone)]
pub enum AttachmentSource {
    /// Bytes uploaded with the request itself
    Inline(FileUpload),
    /// Id of a previously uploaded attachment
    Stored(Uuid),
}

/// A request to send one email to one or more recipients
#[derive(Debug, Clone, Validate)]
pub struct NotificationRequest {
    #[validate(
        length(min = 1, message = "At least one recipient is required"),
        custom(function = "validate_recipients")
    )]
    pub to: Vec<String>,

    #[validate(custom(function = "validate_not_blank", message = "Subject is required"))]
    pub subject: String,

    pub body: NotificationBody,

    pub attachments: Vec<AttachmentSource>,

    pub links: Vec<ResourceLink>,

    /// Provider name; the configured default is used when unset or blank
    pub provider: Option<String>,

    pub is_plain_text: bool,
}

impl NotificationRequest {
    /// A plain-content request with no attachments, links, or provider.
    pub fn text(to: Vec<String>, subject: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            to,
            subject: subject.into(),
            body: NotificationBody::Text(content.into()),
            attachments: Vec::new(),
            links: Vec::new(),
            provider: None,
            is_plain_text: false,
        }
    }

    /// A template-driven request with no attachments, links, or provider.
    pub fn template(
        to: Vec<String>,
        subject: impl Into<String>,
        template_id: impl Into<String>,
        model: Value,
    ) -> Self {
        Self {
            body: NotificationBody::Template {
                template_id: template_id.into(),
                model,
            },
            ..Self::text(to, subject, String::new())
        }
    }

    pub fn stored_attachment_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.attachments.iter().filter_map(|a| match a {
            AttachmentSource::Stored(id) => Some(*id),
            AttachmentSource::Inline(_) => None,
        })
    }

    pub fn inline_attachments(&self) -> impl Iterator<Item = &FileUpload> + '_ {
        self.attachments.iter().filter_map(|a| match a {
            AttachmentSource::Inline(file) => Some(file),
            AttachmentSource::Stored(_) => None,
        })
    }
}

fn validate_recipients(to: &[String]) -> Result<(), ValidationError> {
    match to.iter().find(|address| !address.validate_email()) {
        Some(address) => {
            let mut error = ValidationError::new("email");
            error.message = Some(format!("Invalid email address: {}", address).into());
            Err(error)
        }
        None => Ok(()),
    }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("required"))
    } else {
        Ok(())
    }
}
