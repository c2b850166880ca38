//! Data Transfer Objects for API requests and responses.
//!
//! DTOs are organized by domain:
//! - `attachment` - Attachment upload responses
//! - `email` - Email send and queue requests/responses
//! - `error` - Common error response DTOs
//! - `health` - Health check responses

mod attachment;
mod email;
mod error;
mod health;

pub use attachment::{AttachmentCreatedResponse, AttachmentUploadForm, single_file};
pub use email::{EmailForm, EmailFormSchema, EmailQueuedResponse, QueueEmailRequest};
pub use error::ErrorResponse;
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
