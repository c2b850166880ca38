//! Notification dispatch pipeline.
//!
//! A request moves through validation, provider resolution, content
//! resolution and attachment resolution before it is either handed to a
//! provider (synchronous path) or published as an event (queued path).

use std::sync::Arc;

use futures::future::try_join_all;
use jiff::Timestamp;
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::config::NotificationSettings;
use crate::error::{AppError, AppResult, ValidationFieldError, field_errors_from_validator};
use crate::services::attachments::{AttachmentService, DEFAULT_CONTENT_TYPE};
use crate::services::events::{
    EMAIL_EVENT_TYPE, EventPublisher, NotificationEvent, email_routing_attributes,
};
use crate::services::providers::{
    ContentKind, EmailProvider, MessageBody, OutboundAttachment, OutboundMessage,
    ProviderRegistry, SendReceipt,
};
use crate::services::storage::stream_from_bytes;
use crate::services::templates::TemplateResolver;

use super::request::{
    AttachmentSource, NotificationBody, NotificationRequest, ResourceLink, append_links,
};

/// Which path a request is dispatched on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DispatchMode {
    Synchronous,
    Queued,
}

/// Orchestrates validation, template and attachment resolution, and
/// delivery of notification requests.
#[derive(Clone)]
pub struct NotificationDispatcher {
    settings: Arc<NotificationSettings>,
    registry: ProviderRegistry,
    attachments: AttachmentService,
    templates: TemplateResolver,
    publisher: Arc<dyn EventPublisher>,
}

impl NotificationDispatcher {
    pub fn new(
        settings: Arc<NotificationSettings>,
        registry: ProviderRegistry,
        attachments: AttachmentService,
        templates: TemplateResolver,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            settings,
            registry,
            attachments,
            templates,
            publisher,
        }
    }

    /// Sends the request through its provider and returns the receipt.
    pub async fn send(&self, request: NotificationRequest) -> AppResult<SendReceipt> {
        let provider_name = self.validate(&request, DispatchMode::Synchronous)?;
        let provider = self.provider(&provider_name)?;
        self.ensure_attachments_exist(&request).await?;

        let recipients = request.to.len();
        let attachment_count = request.attachments.len();
        let body = self
            .resolve_body(provider.as_ref(), &request.body, &request.links, request.is_plain_text)
            .await?;
        let attachments = self.resolve_attachments(request.attachments).await?;

        let message = OutboundMessage {
            provider: provider_name.clone(),
            to: request.to,
            subject: request.subject,
            body,
            attachments,
        };

        let receipt = provider.send(message).await?;
        tracing::info!(
            provider = %provider_name,
            recipients,
            attachments = attachment_count,
            message_id = receipt.message_id.as_deref().unwrap_or(""),
            "Email sent"
        );
        Ok(receipt)
    }

    /// Publishes the request as an email event for asynchronous delivery.
    ///
    /// Attachments must reference previous uploads. Nothing is published
    /// when any of them is missing.
    pub async fn enqueue(&self, request: NotificationRequest) -> AppResult<NotificationEvent> {
        let provider_name = self.validate(&request, DispatchMode::Queued)?;
        self.ensure_attachments_exist(&request).await?;

        let attachment_ids: Vec<Uuid> = request.stored_attachment_ids().collect();
        let (content, template_id) = match request.body {
            NotificationBody::Text(content) => (Value::String(content), None),
            NotificationBody::Template { template_id, model } => (model, Some(template_id)),
        };

        let event = NotificationEvent {
            id: Uuid::new_v4(),
            event_type: EMAIL_EVENT_TYPE.to_string(),
            created_at: Timestamp::now(),
            provider: provider_name,
            to: request.to,
            subject: request.subject,
            content,
            template_id,
            is_plain_text: request.is_plain_text,
            attachment_ids,
            links: request.links,
        };

        self.publisher
            .publish(&event, &email_routing_attributes())
            .await?;

        tracing::info!(
            event_id = %event.id,
            provider = %event.provider,
            recipients = event.to.len(),
            attachments = event.attachment_ids.len(),
            bus = self.publisher.name(),
            "Email queued"
        );
        Ok(event)
    }

    /// Collects every field-level problem with the request and returns the
    /// provider name to use, after defaulting.
    fn validate(&self, request: &NotificationRequest, mode: DispatchMode) -> AppResult<String> {
        let mut errors = match request.validate() {
            Ok(()) => Vec::new(),
            Err(e) => field_errors_from_validator(&e),
        };

        match &request.body {
            NotificationBody::Text(content) if content.trim().is_empty() => {
                errors.push(ValidationFieldError::new("content", "Content is required"));
            }
            NotificationBody::Template { template_id, .. } if template_id.trim().is_empty() => {
                errors.push(ValidationFieldError::new(
                    "template_id",
                    "Template id is required",
                ));
            }
            _ => {}
        }

        for file in request.inline_attachments() {
            if mode == DispatchMode::Queued {
                errors.push(ValidationFieldError::new(
                    "attachments",
                    format!(
                        "{} must be uploaded first and referenced by id for queued email",
                        file.file_name
                    ),
                ));
                continue;
            }
            errors.extend(
                self.attachments
                    .validate_file(&file.file_name, file.data.len() as u64),
            );
        }

        let provider = self.provider_name(request.provider.as_deref());
        if !self.registry.contains(&provider) {
            errors.push(ValidationFieldError::new(
                "provider",
                format!("{} has no implementation", provider),
            ));
        }

        match AppError::from_field_errors(errors) {
            Some(err) => {
                tracing::debug!(error = %err, "Notification request rejected");
                Err(err)
            }
            None => Ok(provider),
        }
    }

    /// The requested provider, or the configured default when unset or blank.
    fn provider_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(self.settings.default_email_provider.as_str())
            .to_string()
    }

    fn provider(&self, name: &str) -> AppResult<Arc<dyn EmailProvider>> {
        self.registry.get(name).ok_or_else(|| AppError::Validation {
            field: "provider".to_string(),
            reason: format!("{} has no implementation", name),
        })
    }

    async fn ensure_attachments_exist(&self, request: &NotificationRequest) -> AppResult<()> {
        for id in request.stored_attachment_ids() {
            if !self.attachments.exists(id).await? {
                tracing::debug!(attachment_id = %id, "Referenced attachment does not exist");
                return Err(AppError::attachment_not_found(id));
            }
        }
        Ok(())
    }

    async fn resolve_body(
        &self,
        provider: &dyn EmailProvider,
        body: &NotificationBody,
        links: &[ResourceLink],
        is_plain_text: bool,
    ) -> AppResult<MessageBody> {
        match body {
            NotificationBody::Text(content) => {
                let kind = ContentKind::from_plain_text_flag(is_plain_text);
                Ok(MessageBody::Rendered {
                    content: append_links(content.clone(), links, kind),
                    kind,
                })
            }
            NotificationBody::Template { template_id, model }
                if self.settings.prefer_native_templating
                    && provider.supports_native_templating() =>
            {
                tracing::debug!(
                    provider = provider.name(),
                    template_id = %template_id,
                    "Forwarding template to provider for native rendering"
                );
                Ok(MessageBody::Template {
                    template_id: template_id.clone(),
                    model: model.clone(),
                })
            }
            NotificationBody::Template { template_id, model } => {
                let template = self.templates.resolve(template_id).await?;
                let result = self.templates.substitute(&template.body, model);
                let kind = if template.is_html() {
                    ContentKind::Html
                } else {
                    ContentKind::Plain
                };
                tracing::debug!(
                    template_id = %template_id,
                    matched = result.matched.len(),
                    "Template rendered"
                );
                Ok(MessageBody::Rendered {
                    content: append_links(result.content, links, kind),
                    kind,
                })
            }
        }
    }

    /// Opens every attachment concurrently; the result keeps request order.
    async fn resolve_attachments(
        &self,
        sources: Vec<AttachmentSource>,
    ) -> AppResult<Vec<OutboundAttachment>> {
        let attachments = &self.attachments;
        try_join_all(sources.into_iter().map(|source| async move {
            let attachment = match source {
                AttachmentSource::Inline(file) => OutboundAttachment {
                    name: file.file_name,
                    content_type: file
                        .content_type
                        .filter(|t| !t.trim().is_empty())
                        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
                    content: stream_from_bytes(file.data),
                },
                AttachmentSource::Stored(id) => {
                    let stored = attachments.open(id).await?;
                    OutboundAttachment {
                        name: stored.name,
                        content_type: stored.content_type,
                        content: stored.content,
                    }
                }
            };
            Ok::<_, AppError>(attachment)
        }))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::attachments::FileUpload;
    use crate::services::events::{MemoryEventPublisher, PublishError, RoutingAttributes};
    use crate::services::providers::LogProvider;
    use crate::services::storage::{BlobMetadata, BlobStorage, MemoryBlobStorage, read_all};
    use async_trait::async_trait;
    use axum::body::Bytes;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    struct SentMessage {
        to: Vec<String>,
        subject: String,
        body: MessageBody,
        attachments: Vec<(String, String, Vec<u8>)>,
    }

    /// Records every message it is asked to send.
    struct RecordingProvider {
        name: String,
        native: bool,
        fail: bool,
        sent: Mutex<Vec<SentMessage>>,
    }

    impl RecordingProvider {
        fn new(name: &str, native: bool) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                native,
                fail: false,
                sent: Mutex::new(Vec::new()),
            })
        }

        fn failing(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                native: false,
                fail: true,
                sent: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<SentMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EmailProvider for RecordingProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn supports_native_templating(&self) -> bool {
            self.native
        }

        async fn send(&self, message: OutboundMessage) -> AppResult<SendReceipt> {
            if self.fail {
                return Err(AppError::Provider {
                    provider: self.name.clone(),
                    source: anyhow::anyhow!("upstream unavailable"),
                });
            }
            let mut attachments = Vec::new();
            for attachment in message.attachments {
                let bytes = read_all(attachment.content).await.unwrap();
                attachments.push((attachment.name, attachment.content_type, bytes));
            }
            let recipients = message.to.len();
            self.sent.lock().unwrap().push(SentMessage {
                to: message.to,
                subject: message.subject,
                body: message.body,
                attachments,
            });
            Ok(SendReceipt::new(self.name.clone(), Some("msg-1".to_string()), recipients))
        }
    }

    struct FailingPublisher;

    #[async_trait]
    impl EventPublisher for FailingPublisher {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn publish(
            &self,
            _event: &NotificationEvent,
            _attributes: &RoutingAttributes,
        ) -> Result<(), PublishError> {
            Err(PublishError::Connection("bus unreachable".to_string()))
        }
    }

    struct Harness {
        dispatcher: NotificationDispatcher,
        storage: Arc<MemoryBlobStorage>,
        publisher: MemoryEventPublisher,
        default: Arc<RecordingProvider>,
        native: Arc<RecordingProvider>,
    }

    fn harness_with(
        settings: NotificationSettings,
        publisher: Option<Arc<dyn EventPublisher>>,
    ) -> Harness {
        let settings = Arc::new(settings);
        let storage = Arc::new(MemoryBlobStorage::new());
        let default = RecordingProvider::new("log", false);
        let native = RecordingProvider::new("Sendgrid", true);
        let providers: Vec<Arc<dyn EmailProvider>> = vec![
            default.clone(),
            native.clone(),
            RecordingProvider::failing("broken"),
        ];
        let registry = ProviderRegistry::new(providers).unwrap();
        let memory = MemoryEventPublisher::new();
        let publisher: Arc<dyn EventPublisher> = match publisher {
            Some(publisher) => publisher,
            None => Arc::new(memory.clone()),
        };
        let dispatcher = NotificationDispatcher::new(
            settings.clone(),
            registry,
            AttachmentService::new(storage.clone(), settings.clone()),
            TemplateResolver::from_settings(storage.clone(), &settings).unwrap(),
            publisher,
        );
        Harness {
            dispatcher,
            storage,
            publisher: memory,
            default,
            native,
        }
    }

    fn harness() -> Harness {
        harness_with(
            NotificationSettings {
                allowed_attachment_types: vec!["pdf".to_string(), "txt".to_string()],
                individual_file_size_bytes_limit: 32,
                ..NotificationSettings::default()
            },
            None,
        )
    }

    fn recipients() -> Vec<String> {
        vec!["ada@example.com".to_string()]
    }

    fn inline(name: &str, data: &'static [u8]) -> AttachmentSource {
        AttachmentSource::Inline(FileUpload {
            file_name: name.to_string(),
            content_type: Some("text/plain".to_string()),
            data: Bytes::from_static(data),
        })
    }

    async fn store_template(storage: &MemoryBlobStorage, id: &str, body: &str, content_type: &str) {
        storage
            .upload(
                &format!("templates/{}", id),
                stream_from_bytes(body.as_bytes().to_vec()),
                BlobMetadata::from([("type".to_string(), content_type.to_string())]),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_mandatory_fields_are_named_and_nothing_sent() {
        let h = harness();
        let request = NotificationRequest::text(Vec::new(), "", "");
        let err = h.dispatcher.send(request).await.unwrap_err();

        let fields: Vec<_> = err.field_errors().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"to".to_string()));
        assert!(fields.contains(&"subject".to_string()));
        assert!(fields.contains(&"content".to_string()));
        assert!(h.default.sent().is_empty());
    }

    #[tokio::test]
    async fn test_enqueue_missing_fields_publishes_nothing() {
        let h = harness();
        let request = NotificationRequest::text(Vec::new(), "  ", "Body");
        let err = h.dispatcher.enqueue(request).await.unwrap_err();

        let fields: Vec<_> = err.field_errors().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"to".to_string()));
        assert!(fields.contains(&"subject".to_string()));
        assert!(h.publisher.published().is_empty());
        assert!(h.default.sent().is_empty());
    }

    #[tokio::test]
    async fn test_plain_send_uses_default_provider() {
        let h = harness();
        let mut request = NotificationRequest::text(recipients(), "Hi", "Body");
        request.provider = Some("  ".to_string());
        request.is_plain_text = true;
        request.links = vec![ResourceLink {
            name: "Docs".to_string(),
            link: "https://docs.example.com".to_string(),
        }];

        let receipt = h.dispatcher.send(request).await.unwrap();
        assert_eq!(receipt.provider, "log");
        assert_eq!(receipt.recipients, 1);

        let sent = h.default.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].body,
            MessageBody::Rendered {
                content: "Body\nDocs: https://docs.example.com".to_string(),
                kind: ContentKind::Plain,
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_provider_is_rejected_by_name() {
        let h = harness();
        let mut request = NotificationRequest::text(recipients(), "Hi", "Body");
        request.provider = Some("Mailgun".to_string());

        let errors = h.dispatcher.send(request).await.unwrap_err().field_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "provider");
        assert_eq!(errors[0].message, "Mailgun has no implementation");
    }

    #[tokio::test]
    async fn test_missing_default_provider_still_rejects() {
        let h = harness_with(
            NotificationSettings {
                default_email_provider: "smtp".to_string(),
                ..NotificationSettings::default()
            },
            None,
        );
        let request = NotificationRequest::text(recipients(), "Hi", "Body");
        let errors = h.dispatcher.send(request).await.unwrap_err().field_errors();
        assert_eq!(errors[0].field, "provider");
        assert_eq!(errors[0].message, "smtp has no implementation");
    }

    #[tokio::test]
    async fn test_disallowed_extension_rejected_before_send() {
        let h = harness();
        let mut request = NotificationRequest::text(recipients(), "Hi", "Body");
        request.attachments = vec![inline("payload.exe", b"MZ")];

        let errors = h.dispatcher.send(request).await.unwrap_err().field_errors();
        assert_eq!(errors[0].field, "extension");
        assert_eq!(errors[0].message, "exe is not in list of valid extensions");
        assert!(h.default.sent().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_inline_attachment_names_file_and_size() {
        let h = harness();
        let mut request = NotificationRequest::text(recipients(), "Hi", "Body");
        request.attachments = vec![inline("big.txt", &[b'x'; 40])];

        let errors = h.dispatcher.send(request).await.unwrap_err().field_errors();
        assert_eq!(
            errors[0].message,
            "big.txt size of 40 exceeds the max allowed size of 32"
        );
    }

    #[tokio::test]
    async fn test_inline_and_stored_attachments_are_resolved() {
        let h = harness();
        let stored_id = h
            .dispatcher
            .attachments
            .upload(FileUpload {
                file_name: "report.pdf".to_string(),
                content_type: Some("application/pdf".to_string()),
                data: Bytes::from_static(b"%PDF"),
            })
            .await
            .unwrap();

        let mut request = NotificationRequest::text(recipients(), "Hi", "Body");
        request.attachments = vec![
            inline("notes.txt", b"notes"),
            AttachmentSource::Stored(stored_id),
        ];
        h.dispatcher.send(request).await.unwrap();

        let sent = h.default.sent();
        assert_eq!(
            sent[0].attachments,
            vec![
                ("notes.txt".to_string(), "text/plain".to_string(), b"notes".to_vec()),
                ("report.pdf".to_string(), "application/pdf".to_string(), b"%PDF".to_vec()),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_stored_attachment_is_not_found_on_sync_path() {
        let h = harness();
        let mut request = NotificationRequest::text(recipients(), "Hi", "Body");
        request.attachments = vec![AttachmentSource::Stored(Uuid::new_v4())];

        let err = h.dispatcher.send(request).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { ref entity, .. } if entity == "attachment"));
        assert!(h.default.sent().is_empty());
    }

    #[tokio::test]
    async fn test_template_is_resolved_and_substituted() {
        let h = harness();
        store_template(&h.storage, "welcome", "<p>Hello {{name}}</p>", "text/html").await;

        let request = NotificationRequest::template(
            recipients(),
            "Welcome",
            "welcome",
            json!({"name": "Ada"}),
        );
        h.dispatcher.send(request).await.unwrap();

        assert_eq!(
            h.default.sent()[0].body,
            MessageBody::Rendered {
                content: "<p>Hello Ada</p>".to_string(),
                kind: ContentKind::Html,
            }
        );
    }

    #[tokio::test]
    async fn test_missing_template_is_not_found() {
        let h = harness();
        let request = NotificationRequest::template(recipients(), "Welcome", "nope", json!({}));
        let err = h.dispatcher.send(request).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { ref entity, .. } if entity == "template"));
        assert!(h.default.sent().is_empty());
    }

    #[tokio::test]
    async fn test_native_templating_forwards_raw_template() {
        let h = harness_with(
            NotificationSettings {
                prefer_native_templating: true,
                ..NotificationSettings::default()
            },
            None,
        );
        let mut request =
            NotificationRequest::template(recipients(), "Welcome", "d-42", json!({"name": "Ada"}));
        request.provider = Some("Sendgrid".to_string());

        h.dispatcher.send(request).await.unwrap();
        assert_eq!(
            h.native.sent()[0].body,
            MessageBody::Template {
                template_id: "d-42".to_string(),
                model: json!({"name": "Ada"}),
            }
        );
    }

    #[tokio::test]
    async fn test_native_provider_renders_locally_unless_preferred() {
        let h = harness();
        store_template(&h.storage, "receipt", "Total {{total}}", "text/plain").await;
        let mut request =
            NotificationRequest::template(recipients(), "Receipt", "receipt", json!({"total": 12}));
        request.provider = Some("Sendgrid".to_string());

        h.dispatcher.send(request).await.unwrap();
        assert_eq!(
            h.native.sent()[0].body,
            MessageBody::Rendered {
                content: "Total 12".to_string(),
                kind: ContentKind::Plain,
            }
        );
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let h = harness();
        let mut request = NotificationRequest::text(recipients(), "Hi", "Body");
        request.provider = Some("broken".to_string());
        let err = h.dispatcher.send(request).await.unwrap_err();
        assert!(matches!(err, AppError::Provider { ref provider, .. } if provider == "broken"));
    }

    #[tokio::test]
    async fn test_enqueue_publishes_email_event() {
        let h = harness();
        let stored_id = h
            .dispatcher
            .attachments
            .upload(FileUpload {
                file_name: "a.txt".to_string(),
                content_type: None,
                data: Bytes::from_static(b"a"),
            })
            .await
            .unwrap();

        let mut request = NotificationRequest::text(recipients(), "Hi", "Body");
        request.attachments = vec![AttachmentSource::Stored(stored_id)];
        let event = h.dispatcher.enqueue(request).await.unwrap();

        assert_eq!(event.event_type, "email");
        assert_eq!(event.provider, "log");
        assert_eq!(event.content, json!("Body"));
        assert_eq!(event.attachment_ids, vec![stored_id]);

        let published = h.publisher.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].event, event);
        assert_eq!(published[0].attributes["type"], "email");
        assert!(h.default.sent().is_empty());
    }

    #[tokio::test]
    async fn test_enqueue_keeps_template_model_as_content() {
        let h = harness();
        let request = NotificationRequest::template(
            recipients(),
            "Welcome",
            "welcome",
            json!({"name": "Ada"}),
        );
        let event = h.dispatcher.enqueue(request).await.unwrap();
        assert_eq!(event.template_id.as_deref(), Some("welcome"));
        assert_eq!(event.content, json!({"name": "Ada"}));
    }

    #[tokio::test]
    async fn test_enqueue_missing_attachment_publishes_nothing() {
        let h = harness();
        let mut request = NotificationRequest::text(recipients(), "Hi", "Body");
        request.attachments = vec![AttachmentSource::Stored(Uuid::new_v4())];

        let err = h.dispatcher.enqueue(request).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
        assert!(h.publisher.published().is_empty());
    }

    #[tokio::test]
    async fn test_enqueue_rejects_inline_attachments() {
        let h = harness();
        let mut request = NotificationRequest::text(recipients(), "Hi", "Body");
        request.attachments = vec![inline("a.txt", b"a")];

        let errors = h.dispatcher.enqueue(request).await.unwrap_err().field_errors();
        assert_eq!(errors[0].field, "attachments");
        assert!(h.publisher.published().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_propagates() {
        let failing: Arc<dyn EventPublisher> = Arc::new(FailingPublisher);
        let h = harness_with(NotificationSettings::default(), Some(failing));
        let request = NotificationRequest::text(recipients(), "Hi", "Body");
        let err = h.dispatcher.enqueue(request).await.unwrap_err();
        assert!(matches!(err, AppError::Publish { .. }));
    }

    #[tokio::test]
    async fn test_log_provider_end_to_end() {
        let settings = Arc::new(NotificationSettings::default());
        let storage = Arc::new(MemoryBlobStorage::new());
        let providers: Vec<Arc<dyn EmailProvider>> = vec![Arc::new(LogProvider::new("log", false))];
        let registry = ProviderRegistry::new(providers).unwrap();
        let dispatcher = NotificationDispatcher::new(
            settings.clone(),
            registry,
            AttachmentService::new(storage.clone(), settings.clone()),
            TemplateResolver::from_settings(storage, &settings).unwrap(),
            Arc::new(MemoryEventPublisher::new()),
        );

        let receipt = dispatcher
            .send(NotificationRequest::text(recipients(), "Hi", "Body"))
            .await
            .unwrap();
        assert_eq!(receipt.provider, "log");
    }
}
