//! Error response DTOs.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;

use crate::error::ValidationFieldError;

/// Standard error response format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "code": "VALIDATION_ERROR",
    "message": "Request validation failed",
    "details": {
        "errors": [
            { "field": "extension", "message": "exe is not in list of valid extensions" }
        ]
    },
    "request_id": "5f0c6f5e-8a3c-4d4e-9a53-5b1f0b1e7c3a"
}))]
pub struct ErrorResponse {
    /// Machine readable error code
    pub code: String,
    /// Human readable summary
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    /// Creates a new error response with code and message.
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
            request_id: None,
        }
    }

    /// Adds details to the error response.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Adds request ID to the error response for correlation.
    pub fn with_request_id(mut self, request_id: &str) -> Self {
        self.request_id = Some(request_id.to_string());
        self
    }

    pub fn not_found_error(entity: &str, field: &str, value: &str) -> Self {
        Self::new("NOT_FOUND", &format!("{} not found", capitalize(entity))).with_details(json!({
            "entity": entity,
            "field": field,
            "value": value,
        }))
    }

    /// One response carrying every field-level failure.
    pub fn validation_errors(errors: &[ValidationFieldError]) -> Self {
        Self::new("VALIDATION_ERROR", "Request validation failed")
            .with_details(json!({ "errors": errors }))
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
