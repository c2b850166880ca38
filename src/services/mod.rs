//! Service layer for business logic operations.
//!
//! Services encapsulate the hub's behaviour and coordinate between the
//! storage, provider and bus adapters and the HTTP handlers.

pub mod attachments;
pub mod dispatch;
pub mod events;
pub mod providers;
pub mod storage;
pub mod templates;

use std::sync::Arc;

pub use attachments::AttachmentService;
pub use dispatch::NotificationDispatcher;
pub use providers::ProviderRegistry;

use crate::config::Settings;
use crate::error::AppResult;
use events::EventPublisher;
use storage::BlobStorage;
use templates::TemplateResolver;

/// Aggregates all services for convenient access.
///
/// This struct is designed to be used as Axum application state.
/// Cloning is cheap since every adapter is behind an `Arc`.
#[derive(Clone)]
pub struct Services {
    pub attachments: AttachmentService,
    pub dispatcher: NotificationDispatcher,
    pub providers: ProviderRegistry,
    pub storage: Arc<dyn BlobStorage>,
    pub publisher: Arc<dyn EventPublisher>,
}

impl Services {
    /// Wires services around already constructed adapters.
    pub fn new(
        settings: &Settings,
        storage: Arc<dyn BlobStorage>,
        publisher: Arc<dyn EventPublisher>,
        providers: ProviderRegistry,
    ) -> AppResult<Self> {
        let notification = Arc::new(settings.notification.clone());
        let attachments = AttachmentService::new(storage.clone(), notification.clone());
        let templates = TemplateResolver::from_settings(storage.clone(), &notification)?;
        let dispatcher = NotificationDispatcher::new(
            notification,
            providers.clone(),
            attachments.clone(),
            templates,
            publisher.clone(),
        );

        Ok(Self {
            attachments,
            dispatcher,
            providers,
            storage,
            publisher,
        })
    }

    /// Builds storage, bus and providers from configuration.
    pub async fn from_settings(settings: &Settings) -> AppResult<Self> {
        let storage = storage::from_config(&settings.storage);
        tracing::info!(backend = storage.name(), "Blob storage ready");

        let publisher = events::from_config(&settings.bus).await?;

        let providers = ProviderRegistry::from_config(&settings.providers)?;
        tracing::info!(providers = ?providers.names(), "Email providers registered");

        Self::new(settings, storage, publisher, providers)
    }
}
