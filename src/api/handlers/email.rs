//! Email API handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::EMAIL_TAG;
use crate::api::dto::{
    EmailForm, EmailFormSchema, EmailQueuedResponse, ErrorResponse, QueueEmailRequest,
};
use crate::api::extract::{ApiJson, MultipartForm};
use crate::error::AppResult;
use crate::services::providers::SendReceipt;
use crate::state::AppState;

/// Creates email routes.
///
/// Routes:
/// - POST /notification/email                - Send now
/// - POST /notification/email/template/{id}  - Render a template and send now
/// - POST /notification/email/async          - Queue for asynchronous delivery
pub fn email_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(send_email))
        .routes(routes!(send_template_email))
        .routes(routes!(queue_email))
}

/// POST /api/v1/notification/email - Send an email
///
/// Validates the request, attaches uploaded files and hands the message to
/// the selected provider.
#[utoipa::path(
    post,
    path = "/notification/email",
    tag = EMAIL_TAG,
    request_body(content = EmailFormSchema, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Email accepted by the provider", body = SendReceipt),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Referenced attachment not found", body = ErrorResponse),
        (status = 413, description = "Request body too large", body = ErrorResponse),
        (status = 502, description = "Provider failed to send", body = ErrorResponse)
    )
)]
async fn send_email(
    State(state): State<AppState>,
    MultipartForm(parts): MultipartForm,
) -> AppResult<Json<SendReceipt>> {
    let request = EmailForm::from_parts(parts)?.into_request();
    let receipt = state.services.dispatcher.send(request).await?;
    Ok(Json(receipt))
}

/// POST /api/v1/notification/email/template/{id} - Send a templated email
///
/// Renders template `id` with the form's `model` (unless the provider
/// renders templates natively) and sends it.
#[utoipa::path(
    post,
    path = "/notification/email/template/{id}",
    tag = EMAIL_TAG,
    params(("id" = String, Path, description = "Template id")),
    request_body(content = EmailFormSchema, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Email accepted by the provider", body = SendReceipt),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Template or attachment not found", body = ErrorResponse),
        (status = 413, description = "Request body too large", body = ErrorResponse),
        (status = 502, description = "Provider failed to send", body = ErrorResponse)
    )
)]
async fn send_template_email(
    State(state): State<AppState>,
    Path(template_id): Path<String>,
    MultipartForm(parts): MultipartForm,
) -> AppResult<Json<SendReceipt>> {
    let request = EmailForm::from_parts(parts)?.into_template_request(template_id);
    let receipt = state.services.dispatcher.send(request).await?;
    Ok(Json(receipt))
}

/// POST /api/v1/notification/email/async - Queue an email
///
/// Publishes an email event to the bus. Attachments are referenced by the
/// ids returned from the attachment upload endpoint.
#[utoipa::path(
    post,
    path = "/notification/email/async",
    tag = EMAIL_TAG,
    request_body = QueueEmailRequest,
    responses(
        (status = 202, description = "Email queued", body = EmailQueuedResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Referenced attachment not found", body = ErrorResponse),
        (status = 503, description = "Bus unavailable", body = ErrorResponse)
    )
)]
async fn queue_email(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<QueueEmailRequest>,
) -> AppResult<(StatusCode, Json<EmailQueuedResponse>)> {
    let event = state.services.dispatcher.enqueue(body.into()).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(EmailQueuedResponse { event_id: event.id }),
    ))
}
