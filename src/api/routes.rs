//! Router configuration for the API.
//!
//! This module provides centralized route registration and middleware
//! configuration for the application.

use std::time::Duration;

use axum::{Router, extract::DefaultBodyLimit, http::StatusCode, middleware};
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::doc::{API_PREFIX, ApiDoc};
use crate::api::handlers;
use crate::api::middleware::{logging_middleware, request_id_middleware};
use crate::state::AppState;

/// Allowance for multipart boundaries and part headers on top of the file
/// size limit of an attachment upload
const MULTIPART_OVERHEAD_BYTES: u64 = 16 * 1024;

/// Creates the main application router with all routes and middleware.
///
/// # Middleware Order
/// Middleware is applied in reverse order of declaration (last added runs first):
/// 1. Request ID middleware (runs first) - generates/propagates request IDs
/// 2. Logging middleware (runs second) - logs requests with request IDs
/// 3. Compression
/// 4. Request timeout (`server.request_timeout`, answered with 408)
///
/// # Routes
/// - `/api/v1/attachments` - Attachment upload/download, capped at the
///   per-file limit
/// - `/api/v1/notification/email...` - Email endpoints, capped at the
///   per-request limit
/// - `/health` - Health checks
/// - `/swagger-ui`, `/api-docs/openapi.json` - API documentation
///
/// # Example
/// ```ignore
/// let state = AppState::from_settings(settings).await?;
/// let router = create_router(state);
/// ```
pub fn create_router(state: AppState) -> Router {
    let limits = &state.settings.notification;
    let attachment_limit = body_limit(
        limits
            .individual_file_size_bytes_limit
            .saturating_add(MULTIPART_OVERHEAD_BYTES),
    );
    let request_limit = body_limit(limits.request_size_bytes_limit);
    let request_timeout = Duration::from_secs(state.settings.server.request_timeout);

    let api_routes = OpenApiRouter::new()
        .merge(
            handlers::attachments::attachment_routes()
                .layer(DefaultBodyLimit::max(attachment_limit)),
        )
        .merge(handlers::email::email_routes().layer(DefaultBodyLimit::max(request_limit)));

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest(API_PREFIX, api_routes)
        .merge(handlers::health::health_routes())
        .split_for_parts();

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(CompressionLayer::new())
        // Middleware is applied in reverse order - last added runs first
        // So logging runs after request_id has set the ID
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

fn body_limit(bytes: u64) -> usize {
    usize::try_from(bytes).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::extract::tests::multipart_request;
    use crate::api::middleware::REQUEST_ID_HEADER;
    use crate::config::Settings;
    use crate::services::Services;
    use crate::services::events::MemoryEventPublisher;
    use crate::services::providers::ProviderRegistry;
    use crate::services::storage::{BlobMetadata, BlobStorage, MemoryBlobStorage, stream_from_bytes};
    use axum::body::{Body, Bytes, to_bytes};
    use axum::http::{Method, Request, StatusCode, header};
    use axum::response::Response;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    struct TestApp {
        router: Router,
        state: AppState,
        publisher: MemoryEventPublisher,
    }

    fn test_app_with(settings: Settings) -> TestApp {
        let publisher = MemoryEventPublisher::new();
        let storage: Arc<dyn BlobStorage> = Arc::new(MemoryBlobStorage::new());
        let providers = ProviderRegistry::from_config(&settings.providers).unwrap();
        let services =
            Services::new(&settings, storage, Arc::new(publisher.clone()), providers).unwrap();
        let state = AppState::new(services, settings);
        TestApp {
            router: create_router(state.clone()),
            state,
            publisher,
        }
    }

    fn test_app() -> TestApp {
        test_app_with(Settings::default())
    }

    impl TestApp {
        async fn send(&self, request: Request<Body>) -> Response {
            self.router.clone().oneshot(request).await.unwrap()
        }

        async fn upload(&self, file_name: &str, content: &[u8]) -> Response {
            self.send(multipart_request(
                "/api/v1/attachments",
                &[("file", Some(file_name), content)],
            ))
            .await
        }
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_then_download_round_trips() {
        let app = test_app();

        let response = app.upload("report.txt", b"quarterly numbers").await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
        let id = body_json(response).await["id"].as_str().unwrap().to_string();
        assert_eq!(location, format!("/api/v1/attachments/{}", id));

        let response = app.send(get(&location)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"report.txt\""
        );
        assert_eq!(body_bytes(response).await, b"quarterly numbers");
    }

    #[tokio::test]
    async fn test_upload_disallowed_extension_is_rejected() {
        let app = test_app();
        let response = app.upload("payload.exe", b"MZ").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["details"]["errors"][0]["field"], "extension");
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_upload_without_file_is_rejected() {
        let app = test_app();
        let response = app
            .send(multipart_request("/api/v1/attachments", &[("note", None, b"hi")]))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["details"]["errors"][0]["field"], "file");
    }

    #[tokio::test]
    async fn test_upload_over_body_limit_is_payload_too_large() {
        let mut settings = Settings::default();
        settings.notification.individual_file_size_bytes_limit = 10;
        let app = test_app_with(settings);

        let content = vec![b'x'; 64 * 1024];
        let response = app.upload("big.txt", &content).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body_json(response).await["code"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn test_download_unknown_or_malformed_id_is_not_found() {
        let app = test_app();

        let response = app
            .send(get(&format!("/api/v1/attachments/{}", Uuid::new_v4())))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.send(get("/api/v1/attachments/not-a-uuid")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_send_email_returns_receipt() {
        let app = test_app();
        let response = app
            .send(multipart_request(
                "/api/v1/notification/email",
                &[
                    ("to", None, b"ada@example.com, grace@example.com"),
                    ("subject", None, b"Hello"),
                    ("content", None, b"<p>Hi</p>"),
                    ("files", Some("notes.txt"), b"notes"),
                ],
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["provider"], "log");
        assert_eq!(body["recipients"], 2);
    }

    #[tokio::test]
    async fn test_send_email_missing_fields_lists_each() {
        let app = test_app();
        let response = app
            .send(multipart_request(
                "/api/v1/notification/email",
                &[("provider", None, b"Mailgun")],
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        let fields: Vec<&str> = body["details"]["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        for field in ["to", "subject", "content", "provider"] {
            assert!(fields.contains(&field), "missing {} in {:?}", field, fields);
        }
    }

    #[tokio::test]
    async fn test_template_email_renders_stored_template() {
        let app = test_app();
        app.state
            .services
            .storage
            .upload(
                "templates/welcome",
                stream_from_bytes(b"Hello {{name}}".to_vec()),
                BlobMetadata::from([("type".to_string(), "text/plain".to_string())]),
            )
            .await
            .unwrap();

        let response = app
            .send(multipart_request(
                "/api/v1/notification/email/template/welcome",
                &[
                    ("to", None, b"ada@example.com"),
                    ("subject", None, b"Welcome"),
                    ("model", None, br#"{"name":"Ada"}"#),
                ],
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_template_email_missing_template_is_not_found() {
        let app = test_app();
        let response = app
            .send(multipart_request(
                "/api/v1/notification/email/template/missing",
                &[("to", None, b"ada@example.com"), ("subject", None, b"Welcome")],
            ))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["details"]["entity"], "template");
    }

    #[tokio::test]
    async fn test_queue_email_publishes_event() {
        let app = test_app();
        let response = app.upload("a.txt", b"a").await;
        let id = body_json(response).await["id"].clone();

        let response = app
            .send(post_json(
                "/api/v1/notification/email/async",
                json!({
                    "to": ["ada@example.com"],
                    "subject": "Queued",
                    "content": "Body",
                    "attachment_ids": [id],
                }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let event_id = body_json(response).await["event_id"].as_str().unwrap().to_string();

        let published = app.publisher.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].event.id.to_string(), event_id);
        assert_eq!(published[0].attributes["type"], "email");
    }

    #[tokio::test]
    async fn test_queue_email_missing_attachment_publishes_nothing() {
        let app = test_app();
        let response = app
            .send(post_json(
                "/api/v1/notification/email/async",
                json!({
                    "to": ["ada@example.com"],
                    "subject": "Queued",
                    "content": "Body",
                    "attachment_ids": [Uuid::new_v4()],
                }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(app.publisher.published().is_empty());
    }

    #[tokio::test]
    async fn test_queue_email_missing_fields_publishes_nothing() {
        let app = test_app();
        let response = app
            .send(post_json(
                "/api/v1/notification/email/async",
                json!({ "to": [], "subject": " ", "content": "Body" }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        let fields: Vec<&str> = body["details"]["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"to"), "{:?}", fields);
        assert!(fields.contains(&"subject"), "{:?}", fields);
        assert!(app.publisher.published().is_empty());
    }

    #[tokio::test]
    async fn test_stalled_request_times_out() {
        let mut settings = Settings::default();
        settings.server.request_timeout = 1;
        let app = test_app_with(settings);

        let stalled = futures::stream::pending::<Result<Bytes, std::io::Error>>();
        let response = app
            .send(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/v1/attachments")
                    .header(
                        header::CONTENT_TYPE,
                        "multipart/form-data; boundary=stalled-boundary",
                    )
                    .body(Body::from_stream(stalled))
                    .unwrap(),
            )
            .await;

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_queue_email_malformed_json_is_bad_request() {
        let app = test_app();
        let response = app
            .send(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/v1/notification/email/async")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{\"to\":"))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_and_openapi_document() {
        let app = test_app();

        let response = app.send(get("/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(body_json(response).await["checks"]["storage"]["status"], "healthy");

        let response = app.send(get("/api-docs/openapi.json")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let doc = body_json(response).await;
        assert!(doc["paths"]["/api/v1/notification/email/async"].is_object());
        assert!(doc["paths"]["/api/v1/attachments/{id}"].is_object());
    }
}
