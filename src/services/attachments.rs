//! Attachment upload and retrieval on top of blob storage.

use std::sync::Arc;

use axum::body::Bytes;
use uuid::Uuid;

use crate::config::NotificationSettings;
use crate::error::{AppError, AppResult, ValidationFieldError};
use crate::services::storage::{BlobMetadata, BlobStorage, BlobStream, stream_from_bytes};

/// Content type reported for attachments stored without one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A file received from a client, fully buffered
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// A stored attachment opened for reading
pub struct StoredAttachment {
    pub id: Uuid,
    pub name: String,
    pub content_type: String,
    pub content: BlobStream,
}

impl std::fmt::Debug for StoredAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredAttachment")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Text after the last `.` of a file name, if any.
pub fn extension_of(file_name: &str) -> Option<&str> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

#[derive(Clone)]
pub struct AttachmentService {
    storage: Arc<dyn BlobStorage>,
    settings: Arc<NotificationSettings>,
}

impl AttachmentService {
    pub fn new(storage: Arc<dyn BlobStorage>, settings: Arc<NotificationSettings>) -> Self {
        Self { storage, settings }
    }

    /// Blob path of an attachment id.
    pub fn path_for(&self, id: Uuid) -> String {
        format!("{}/{}", self.settings.attachment_container_name, id)
    }

    /// Checks one file against the extension allow-list and the per-file
    /// size limit, reporting every violation.
    pub fn validate_file(&self, file_name: &str, size: u64) -> Vec<ValidationFieldError> {
        let mut errors = Vec::new();

        match extension_of(file_name) {
            None => errors.push(ValidationFieldError::new(
                "extension",
                format!("{} has no file extension", file_name),
            )),
            Some(extension) if !self.settings.is_allowed_extension(extension) => {
                errors.push(ValidationFieldError::new(
                    "extension",
                    format!("{} is not in list of valid extensions", extension),
                ))
            }
            Some(_) => {}
        }

        let limit = self.settings.individual_file_size_bytes_limit;
        if size > limit {
            errors.push(ValidationFieldError::new(
                "size",
                format!(
                    "{} size of {} exceeds the max allowed size of {}",
                    file_name, size, limit
                ),
            ));
        }

        errors
    }

    /// Validates and stores a new attachment under a fresh id.
    pub async fn upload(&self, file: FileUpload) -> AppResult<Uuid> {
        if let Some(err) =
            AppError::from_field_errors(self.validate_file(&file.file_name, file.data.len() as u64))
        {
            return Err(err);
        }

        let id = Uuid::new_v4();
        let path = self.path_for(id);
        let metadata = BlobMetadata::from([
            ("name".to_string(), file.file_name.clone()),
            ("id".to_string(), id.to_string()),
            (
                "type".to_string(),
                file.content_type
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            ),
        ]);

        let size = self
            .storage
            .upload(&path, stream_from_bytes(file.data), metadata)
            .await
            .map_err(|e| AppError::storage("upload attachment", e))?;

        tracing::info!(
            attachment_id = %id,
            file_name = %file.file_name,
            size,
            backend = self.storage.name(),
            "Attachment uploaded"
        );

        Ok(id)
    }

    pub async fn exists(&self, id: Uuid) -> AppResult<bool> {
        self.storage
            .exists(&self.path_for(id))
            .await
            .map_err(|e| AppError::storage("check attachment", e))
    }

    /// Opens a stored attachment, failing with `NotFound` when it is missing.
    pub async fn open(&self, id: Uuid) -> AppResult<StoredAttachment> {
        let path = self.path_for(id);

        let metadata = self
            .storage
            .get_metadata(&path)
            .await
            .map_err(|e| AppError::storage("read attachment metadata", e))?
            .ok_or_else(|| AppError::attachment_not_found(id))?;

        let content = self
            .storage
            .download(&path)
            .await
            .map_err(|e| AppError::storage("download attachment", e))?
            .ok_or_else(|| AppError::attachment_not_found(id))?;

        Ok(StoredAttachment {
            id,
            name: metadata
                .get("name")
                .cloned()
                .unwrap_or_else(|| id.to_string()),
            content_type: metadata
                .get("type")
                .cloned()
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            content,
        })
    }
}
