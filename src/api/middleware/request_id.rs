//! Request ID middleware for request tracing.
//!
//! Every request gets an identifier, either taken from the `x-request-id`
//! header or freshly generated. It is echoed on the response and stamped
//! into JSON error bodies.

use axum::{
    Json,
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::api::dto::ErrorResponse;

/// Header name for request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID stored in request extensions for downstream access.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Middleware that ensures every request has a unique request ID.
///
/// # Behavior
/// - Uses a non-empty X-Request-ID header when present, otherwise a new UUID v4
/// - Stores the request ID in request extensions for downstream handlers
/// - Adds the request ID to the response headers
/// - Fills `request_id` in error bodies produced from `AppError`
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Some(error) = response.extensions_mut().remove::<ErrorResponse>() {
        let status = response.status();
        response = (status, Json(error.with_request_id(&request_id))).into_response();
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    response
}
