//! Attachment API handlers.
//!
//! Provides HTTP handlers for uploading attachments and streaming them back.

use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use uuid::Uuid;

use crate::api::doc::{API_PREFIX, ATTACHMENT_TAG};
use crate::api::dto::{AttachmentCreatedResponse, AttachmentUploadForm, ErrorResponse, single_file};
use crate::api::extract::MultipartForm;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Creates attachment routes.
///
/// Routes:
/// - POST /attachments      - Upload one file
/// - GET  /attachments/{id} - Download a stored file
pub fn attachment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(upload_attachment))
        .routes(routes!(download_attachment))
}

/// POST /api/v1/attachments - Upload an attachment
///
/// Stores a single file under a new id. The extension must be in the
/// configured allow-list and the file must not exceed the per-file limit.
#[utoipa::path(
    post,
    path = "/attachments",
    tag = ATTACHMENT_TAG,
    request_body(content = AttachmentUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Attachment stored", body = AttachmentCreatedResponse,
            headers(("Location" = String, description = "URL of the stored attachment"))),
        (status = 400, description = "Missing file, extension not allowed or file too large", body = ErrorResponse),
        (status = 413, description = "Request body too large", body = ErrorResponse)
    )
)]
async fn upload_attachment(
    State(state): State<AppState>,
    MultipartForm(parts): MultipartForm,
) -> AppResult<impl IntoResponse> {
    let file = single_file(parts)?;
    let id = state.services.attachments.upload(file).await?;

    let location = format!("{}/attachments/{}", API_PREFIX, id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(AttachmentCreatedResponse { id }),
    ))
}

/// GET /api/v1/attachments/{id} - Download an attachment
///
/// Streams the stored bytes with their original content type and filename.
#[utoipa::path(
    get,
    path = "/attachments/{id}",
    tag = ATTACHMENT_TAG,
    params(("id" = String, Path, description = "Attachment id")),
    responses(
        (status = 200, description = "Attachment content", content_type = "application/octet-stream", body = Vec<u8>),
        (status = 404, description = "Attachment not found", body = ErrorResponse)
    )
)]
async fn download_attachment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    // A malformed id cannot name a stored attachment.
    let id = Uuid::parse_str(&id).map_err(|_| AppError::attachment_not_found(&id))?;
    let attachment = state.services.attachments.open(id).await?;

    tracing::debug!(attachment_id = %id, file_name = %attachment.name, "Streaming attachment");

    Ok((
        [
            (header::CONTENT_TYPE, attachment.content_type),
            (header::CONTENT_DISPOSITION, content_disposition(&attachment.name)),
        ],
        Body::from_stream(ReaderStream::new(attachment.content)),
    )
        .into_response())
}

/// `attachment` disposition with an ASCII `filename` and an RFC 5987
/// `filename*` carrying the exact UTF-8 name.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if fallback == file_name {
        return format!("attachment; filename=\"{}\"", file_name);
    }

    let encoded: String = file_name
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() || b"-._~".contains(&b) {
                (b as char).to_string()
            } else {
                format!("%{:02X}", b)
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}
