//! Error handler for converting AppError to HTTP responses.
//!
//! This module implements the IntoResponse trait for AppError,
//! providing consistent error response formatting across the API.
//! Includes status code mapping, sanitization of internal failures,
//! and conversion of axum extractor rejections.

use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::api::dto::ErrorResponse;
use crate::error::AppError;

impl IntoResponse for AppError {
    /// Converts an AppError into an HTTP response.
    ///
    /// The rendered [`ErrorResponse`] is also stored in the response
    /// extensions so the request id middleware can stamp it.
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);

        if status.is_server_error() {
            tracing::error!(
                error = %error_chain(&self),
                status = status.as_u16(),
                "Request failed"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let error_response = error_to_response_body(&self);
        let mut response = (status, Json(error_response.clone())).into_response();
        response.extensions_mut().insert(error_response);
        response
    }
}

/// Joins an error and its sources into one line for logging.
fn error_chain(error: &AppError) -> String {
    let mut chain = vec![error.to_string()];
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    chain.join(": ")
}

/// Maps an AppError variant to its corresponding HTTP status code.
pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::Validation { .. } => StatusCode::BAD_REQUEST,
        AppError::ValidationErrors { .. } => StatusCode::BAD_REQUEST,
        AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        AppError::Provider { .. } => StatusCode::BAD_GATEWAY,
        AppError::Publish { .. } => StatusCode::SERVICE_UNAVAILABLE,
        AppError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        AppError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Maps an AppError variant to its error code string.
pub fn error_to_code(error: &AppError) -> &'static str {
    match error {
        AppError::NotFound { .. } => "NOT_FOUND",
        AppError::Validation { .. } => "VALIDATION_ERROR",
        AppError::ValidationErrors { .. } => "VALIDATION_ERROR",
        AppError::BadRequest { .. } => "BAD_REQUEST",
        AppError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
        AppError::Provider { .. } => "PROVIDER_ERROR",
        AppError::Publish { .. } => "PUBLISH_ERROR",
        AppError::Storage { .. } => "STORAGE_ERROR",
        AppError::Configuration { .. } => "CONFIGURATION_ERROR",
        AppError::Internal { .. } => "INTERNAL_ERROR",
    }
}

/// Builds the JSON body for an error. Sources are never exposed.
pub fn error_to_response_body(error: &AppError) -> ErrorResponse {
    match error {
        AppError::NotFound {
            entity,
            field,
            value,
        } => ErrorResponse::not_found_error(entity, field, value),
        AppError::Validation { .. } | AppError::ValidationErrors { .. } => {
            ErrorResponse::validation_errors(&error.field_errors())
        }
        AppError::BadRequest { message } => ErrorResponse::new(error_to_code(error), message),
        AppError::PayloadTooLarge { message } => {
            ErrorResponse::new(error_to_code(error), message)
        }
        AppError::Provider { provider, .. } => ErrorResponse::new(
            error_to_code(error),
            &format!("Provider '{}' failed to send the message", provider),
        )
        .with_details(json!({ "provider": provider })),
        AppError::Publish { .. } => ErrorResponse::new(
            error_to_code(error),
            "The notification bus is unavailable",
        ),
        AppError::Storage { operation, .. } => ErrorResponse::new(
            error_to_code(error),
            &format!("Storage operation failed: {}", operation),
        )
        .with_details(json!({ "operation": operation })),
        AppError::Configuration { key, .. } => ErrorResponse::new(
            error_to_code(error),
            &format!("Configuration error: {}", key),
        )
        .with_details(json!({ "key": key })),
        AppError::Internal { .. } => {
            ErrorResponse::new(error_to_code(error), "An internal error occurred")
        }
    }
}

fn rejection_to_error(status: StatusCode, message: String) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge { message }
    } else {
        AppError::BadRequest { message }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        rejection_to_error(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        rejection_to_error(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(error: MultipartError) -> Self {
        rejection_to_error(error.status(), error.body_text())
    }
}
