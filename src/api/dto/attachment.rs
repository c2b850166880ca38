//! Attachment DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::extract::FormPart;
use crate::error::{AppError, AppResult};
use crate::services::attachments::FileUpload;

/// Response for a stored attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AttachmentCreatedResponse {
    /// Id to reference the attachment by
    pub id: Uuid,
}

/// Multipart body of an attachment upload (documentation only)
#[derive(Debug, ToSchema)]
pub struct AttachmentUploadForm {
    /// The file to store
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Picks the single file out of an upload form.
pub fn single_file(parts: Vec<FormPart>) -> AppResult<FileUpload> {
    let mut files = parts.into_iter().filter_map(|part| match part {
        FormPart::File(file) => Some(file),
        FormPart::Text { .. } => None,
    });

    let file = files.next().ok_or_else(|| AppError::Validation {
        field: "file".to_string(),
        reason: "A file is required".to_string(),
    })?;
    if files.next().is_some() {
        return Err(AppError::BadRequest {
            message: "Only one file can be uploaded per request".to_string(),
        });
    }
    Ok(file)
}
