mod app_error;

pub use app_error::{AppError, AppResult, ValidationFieldError, field_errors_from_validator};
