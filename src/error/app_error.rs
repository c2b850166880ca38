use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// A single field-scoped validation failure.
///
/// Every rejection names the offending field and a human readable reason so
/// that the caller can correct the request without guessing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ValidationFieldError {
    /// Field (or pseudo-field such as `extension`) that failed validation
    pub field: String,
    /// Reason the value was rejected
    pub message: String,
}

impl ValidationFieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application-wide error type that represents all possible errors in the system.
///
/// This enum provides structured information for the different failure
/// scenarios of the hub, supporting automatic conversion from anyhow and
/// carrying enough context for both logging and API responses.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found error with entity, field, and value information
    #[error("Resource not found: {entity} with {field}={value}")]
    NotFound {
        entity: String,
        field: String,
        value: String,
    },

    /// Validation error with field-specific details
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Several validation failures collected for one request
    #[error("Validation failed: {} error(s)", errors.len())]
    ValidationErrors { errors: Vec<ValidationFieldError> },

    /// Bad request error with descriptive message
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// Request body exceeded the configured limit
    #[error("Payload too large: {message}")]
    PayloadTooLarge { message: String },

    /// The selected provider failed to send the message
    #[error("Provider '{provider}' failed to send message")]
    Provider {
        provider: String,
        #[source]
        source: anyhow::Error,
    },

    /// The message bus rejected a notification event
    #[error("Failed to publish notification event")]
    Publish {
        #[source]
        source: anyhow::Error,
    },

    /// Blob storage operation error with operation context
    #[error("Storage operation failed: {operation}")]
    Storage {
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    /// Configuration error with key information
    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Shorthand for a missing attachment.
    pub fn attachment_not_found(id: impl ToString) -> Self {
        AppError::NotFound {
            entity: "attachment".to_string(),
            field: "id".to_string(),
            value: id.to_string(),
        }
    }

    /// Shorthand for a missing template.
    pub fn template_not_found(id: impl ToString) -> Self {
        AppError::NotFound {
            entity: "template".to_string(),
            field: "id".to_string(),
            value: id.to_string(),
        }
    }

    /// Wraps a blob storage failure with the operation that hit it.
    pub fn storage(operation: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        AppError::Storage {
            operation: operation.into(),
            source: source.into(),
        }
    }

    /// Collapses a list of field errors into the matching variant.
    ///
    /// Returns `None` for an empty list so callers can use `?` on the
    /// `Option` when nothing failed.
    pub fn from_field_errors(errors: Vec<ValidationFieldError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(AppError::ValidationErrors { errors })
        }
    }

    /// Every field error carried by this error, flattened.
    pub fn field_errors(&self) -> Vec<ValidationFieldError> {
        match self {
            AppError::Validation { field, reason } => {
                vec![ValidationFieldError::new(field.clone(), reason.clone())]
            }
            AppError::ValidationErrors { errors } => errors.clone(),
            _ => Vec::new(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::ValidationErrors {
            errors: field_errors_from_validator(&errors),
        }
    }
}

impl From<crate::config::error::ConfigError> for AppError {
    fn from(error: crate::config::error::ConfigError) -> Self {
        let key = match &error {
            crate::config::error::ConfigError::ValidationError { field, .. } => field.clone(),
            _ => "settings".to_string(),
        };
        AppError::Configuration {
            key,
            source: error.into(),
        }
    }
}

/// Flattens `validator` output into field errors, ordered by field name.
pub fn field_errors_from_validator(
    errors: &validator::ValidationErrors,
) -> Vec<ValidationFieldError> {
    let mut collected: Vec<ValidationFieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                ValidationFieldError::new(field.clone(), message)
            })
        })
        .collect();
    collected.sort_by(|a, b| a.field.cmp(&b.field));
    collected
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Debug, Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "subject is required"))]
        subject: String,
        #[validate(length(min = 1))]
        to: Vec<String>,
    }

    #[test]
    fn test_from_validator_errors_names_fields() {
        let sample = Sample {
            subject: String::new(),
            to: vec![],
        };
        let err: AppError = sample.validate().unwrap_err().into();
        let errors = err.field_errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "subject");
        assert_eq!(errors[0].message, "subject is required");
        assert_eq!(errors[1].field, "to");
        assert_eq!(errors[1].message, "to is invalid");
    }

    #[test]
    fn test_from_field_errors_empty_is_none() {
        assert!(AppError::from_field_errors(Vec::new()).is_none());
        let err = AppError::from_field_errors(vec![ValidationFieldError::new("to", "missing")]);
        assert!(
            matches!(err, Some(AppError::ValidationErrors { ref errors }) if errors.len() == 1)
        );
    }

    #[test]
    fn test_not_found_helpers() {
        let err = AppError::attachment_not_found("abc");
        assert_eq!(err.to_string(), "Resource not found: attachment with id=abc");
        let err = AppError::template_not_found("welcome");
        assert_eq!(err.to_string(), "Resource not found: template with id=welcome");
    }
}
