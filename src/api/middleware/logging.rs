//! Logging middleware for request/response tracing.
//!
//! This middleware logs incoming requests and outgoing responses with
//! timing information and request correlation via request IDs.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{Instrument, Level, info, span, warn};

use super::RequestId;

/// Middleware that logs request and response information.
///
/// The whole request, including the handler and any logs emitted by the
/// dispatch pipeline, runs inside an `http_request` span.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let span = span!(
        Level::INFO,
        "http_request",
        method = %method,
        path = %uri.path(),
        request_id = %request_id
    );

    async move {
        info!("Request received");

        let start = Instant::now();
        let response = next.run(request).await;
        let duration_ms = start.elapsed().as_millis();
        let status = response.status();

        if status.is_server_error() {
            warn!(status = status.as_u16(), duration_ms, "Response sent");
        } else {
            info!(status = status.as_u16(), duration_ms, "Response sent");
        }

        response
    }
    .instrument(span)
    .await
}
