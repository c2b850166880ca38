//! Request extractors whose rejections are [`AppError`]s.

use axum::{
    Json,
    extract::{FromRequest, Multipart, Request, multipart::Field, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};
use crate::services::attachments::FileUpload;

/// JSON body extractor that rejects with the API's error format.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> AppResult<Self> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// One multipart part, either a text value or a file.
#[derive(Debug)]
pub enum FormPart {
    Text { name: String, value: String },
    File(FileUpload),
}

/// Multipart body buffered into its parts, in arrival order.
///
/// Body limits are enforced by the route's `DefaultBodyLimit`; exceeding it
/// surfaces as [`AppError::PayloadTooLarge`].
#[derive(Debug)]
pub struct MultipartForm(pub Vec<FormPart>);

impl<S> FromRequest<S> for MultipartForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> AppResult<Self> {
        let mut multipart = Multipart::from_request(req, state).await?;
        let mut parts = Vec::new();
        while let Some(field) = multipart.next_field().await? {
            if let Some(part) = read_part(field).await? {
                parts.push(part);
            }
        }
        Ok(MultipartForm(parts))
    }
}

async fn read_part(field: Field<'_>) -> AppResult<Option<FormPart>> {
    let name = field.name().unwrap_or_default().to_string();

    match field.file_name().map(str::to_string) {
        // Browsers send an empty file part for an untouched file input.
        Some(file_name) if file_name.is_empty() => Ok(None),
        Some(file_name) => {
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await?;
            Ok(Some(FormPart::File(FileUpload {
                file_name,
                content_type,
                data,
            })))
        }
        None => {
            let value = field.text().await?;
            Ok(Some(FormPart::Text { name, value }))
        }
    }
}
