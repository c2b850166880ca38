use utoipa::OpenApi;

/// Path prefix of the versioned API
pub const API_PREFIX: &str = "/api/v1";

pub const ATTACHMENT_TAG: &str = "Attachments";
pub const EMAIL_TAG: &str = "Email";
pub const HEALTH_TAG: &str = "Health";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Notification Hub",
        description = "Attachment storage and email dispatch through pluggable providers",
    ),
    components(
        schemas(
            crate::api::dto::ErrorResponse,
            crate::error::ValidationFieldError,
            crate::services::dispatch::ResourceLink,
            crate::services::events::NotificationEvent,
        )
    ),
    tags(
        (name = ATTACHMENT_TAG, description = "Attachment upload and download"),
        (name = EMAIL_TAG, description = "Synchronous, templated and queued email"),
        (name = HEALTH_TAG, description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;
