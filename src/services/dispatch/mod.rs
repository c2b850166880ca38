//! Validation, resolution and delivery of notification requests.

mod pipeline;
mod request;

pub use pipeline::NotificationDispatcher;
pub use request::{
    AttachmentSource, NotificationBody, NotificationRequest, ResourceLink, append_links,
};
