//! Template lookup by id.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cached::{Cached, TimedSizedCache};

use crate::config::settings::{NotificationSettings, TemplateCacheSettings};
use crate::error::{AppError, AppResult};
use crate::services::storage::{BlobStorage, StorageError, read_all};

use super::substitution::{Placeholders, SubstitutionResult};

/// Content type assumed for templates stored without a `type` metadata entry
pub const DEFAULT_TEMPLATE_CONTENT_TYPE: &str = "text/html";

/// A template as fetched from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTemplate {
    pub id: String,
    pub body: String,
    pub content_type: String,
}

impl ResolvedTemplate {
    /// Whether the body should be sent as rich (HTML) content.
    pub fn is_html(&self) -> bool {
        self.content_type.to_ascii_lowercase().contains("html")
    }
}

/// Source of template bodies
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Returns `Ok(None)` when no template has this id.
    async fn fetch(&self, id: &str) -> AppResult<Option<ResolvedTemplate>>;
}

/// Reads templates from `{container}/{id}` in blob storage.
pub struct BlobTemplateStore {
    storage: Arc<dyn BlobStorage>,
    container: String,
}

impl BlobTemplateStore {
    pub fn new(storage: Arc<dyn BlobStorage>, container: impl Into<String>) -> Self {
        Self {
            storage,
            container: container.into(),
        }
    }
}

#[async_trait]
impl TemplateStore for BlobTemplateStore {
    async fn fetch(&self, id: &str) -> AppResult<Option<ResolvedTemplate>> {
        let path = format!("{}/{}", self.container, id);

        let metadata = match self.storage.get_metadata(&path).await {
            Ok(Some(metadata)) => metadata,
            Ok(None) => return Ok(None),
            // An id that cannot form a valid path names no template.
            Err(StorageError::InvalidPath { .. }) => return Ok(None),
            Err(e) => return Err(AppError::storage("read template metadata", e)),
        };

        let Some(stream) = self
            .storage
            .download(&path)
            .await
            .map_err(|e| AppError::storage("download template", e))?
        else {
            return Ok(None);
        };

        let raw = read_all(stream)
            .await
            .map_err(|e| AppError::storage("download template", e))?;
        let body = String::from_utf8(raw).map_err(|e| AppError::storage("decode template", e))?;

        Ok(Some(ResolvedTemplate {
            id: id.to_string(),
            body,
            content_type: metadata
                .get("type")
                .cloned()
                .unwrap_or_else(|| DEFAULT_TEMPLATE_CONTENT_TYPE.to_string()),
        }))
    }
}

/// TTL + size bounded cache in front of another store.
///
/// Only hits are cached so a template uploaded after a miss is picked up on
/// the next request.
pub struct CachedTemplateStore<S> {
    inner: S,
    cache: Mutex<TimedSizedCache<String, ResolvedTemplate>>,
}

impl<S: TemplateStore> CachedTemplateStore<S> {
    pub fn new(inner: S, settings: &TemplateCacheSettings) -> Self {
        let cache = TimedSizedCache::with_size_and_lifespan(
            settings.max_size,
            Duration::from_secs(settings.ttl_seconds),
        );
        Self {
            inner,
            cache: Mutex::new(cache),
        }
    }

    fn cached(&self, id: &str) -> Option<ResolvedTemplate> {
        let mut cache = self.cache.lock().unwrap_or_else(|p| p.into_inner());
        cache.cache_get(id).cloned()
    }
}

#[async_trait]
impl<S: TemplateStore> TemplateStore for CachedTemplateStore<S> {
    async fn fetch(&self, id: &str) -> AppResult<Option<ResolvedTemplate>> {
        if let Some(template) = self.cached(id) {
            tracing::trace!(template_id = %id, "Template cache hit");
            return Ok(Some(template));
        }

        let fetched = self.inner.fetch(id).await?;
        if let Some(template) = &fetched {
            let mut cache = self.cache.lock().unwrap_or_else(|p| p.into_inner());
            cache.cache_set(id.to_string(), template.clone());
        }
        Ok(fetched)
    }
}

/// Resolves templates and fills in their placeholders.
#[derive(Clone)]
pub struct TemplateResolver {
    store: Arc<dyn TemplateStore>,
    placeholders: Placeholders,
}

impl TemplateResolver {
    pub fn new(store: Arc<dyn TemplateStore>, open: &str, close: &str) -> AppResult<Self> {
        let placeholders = Placeholders::new(open, close).map_err(|e| AppError::Configuration {
            key: "notification.placeholder_open".to_string(),
            source: e.into(),
        })?;
        Ok(Self {
            store,
            placeholders,
        })
    }

    /// Builds the blob-backed resolver, wrapping it in a cache when enabled.
    pub fn from_settings(
        storage: Arc<dyn BlobStorage>,
        settings: &NotificationSettings,
    ) -> AppResult<Self> {
        let blob_store = BlobTemplateStore::new(storage, &settings.template_container_name);
        let store: Arc<dyn TemplateStore> = if settings.template_cache.enabled {
            Arc::new(CachedTemplateStore::new(blob_store, &settings.template_cache))
        } else {
            Arc::new(blob_store)
        };
        Self::new(store, &settings.placeholder_open, &settings.placeholder_close)
    }

    /// Fetches the template or fails with `NotFound`.
    pub async fn resolve(&self, id: &str) -> AppResult<ResolvedTemplate> {
        self.store
            .fetch(id)
            .await?
            .ok_or_else(|| AppError::template_not_found(id))
    }

    pub fn substitute(&self, body: &str, model: &serde_json::Value) -> SubstitutionResult {
        self.placeholders.substitute(body, model)
    }
}
