//! Health check endpoint handlers.
//!
//! This module provides health check functionality for monitoring
//! and load balancer health checks.

use crate::api::doc::HEALTH_TAG;
use crate::api::dto::{ComponentHealth, HealthResponse, HealthStatus};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use jiff::Timestamp;
use std::collections::BTreeMap;
use std::time::Instant;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Blob path looked up by the storage check; it never exists.
const STORAGE_CHECK_PATH: &str = "health/check";

/// Creates health check routes.
///
/// # Routes
/// - `GET /health` - Basic health check
/// - `GET /health/ready` - Readiness check
/// - `GET /health/live` - Liveness check
pub fn health_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health_check))
        .routes(routes!(readiness_check))
        .routes(routes!(liveness_check))
}

/// Basic health check endpoint.
///
/// Reports blob storage reachability, the bus backend and the number of
/// registered providers.
///
/// # Responses
/// - `200 OK` - Service is healthy
/// - `503 Service Unavailable` - Service is unhealthy
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse)
    ),
    tag = HEALTH_TAG
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let mut checks = BTreeMap::new();
    checks.insert("storage".to_string(), check_storage(&state).await);
    checks.insert("bus".to_string(), check_bus(&state));
    checks.insert("providers".to_string(), check_providers(&state));

    let status = overall_status(checks.values().map(|c| c.status));
    let response = HealthResponse {
        status,
        version: state.settings.application.version.clone(),
        timestamp: Timestamp::now().to_string(),
        checks,
    };

    let code = match status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (code, Json(response))
}

/// Readiness check endpoint.
///
/// # Responses
/// - `200 OK` - Service is ready
/// - `503 Service Unavailable` - Service is not ready
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Service is ready"),
        (status = 503, description = "Service is not ready")
    ),
    tag = HEALTH_TAG
)]
pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    let storage = check_storage(&state).await;
    let providers = check_providers(&state);

    match overall_status([storage.status, providers.status]) {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded | HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Liveness check endpoint.
///
/// This is a lightweight check that doesn't test external dependencies.
#[utoipa::path(
    get,
    path = "/health/live",
    responses(
        (status = 200, description = "Service is alive")
    ),
    tag = HEALTH_TAG
)]
pub async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

/// The worst status wins; no checks at all counts as healthy.
fn overall_status(statuses: impl IntoIterator<Item = HealthStatus>) -> HealthStatus {
    statuses
        .into_iter()
        .max()
        .unwrap_or(HealthStatus::Healthy)
}

async fn check_storage(state: &AppState) -> ComponentHealth {
    let start_time = Instant::now();
    let storage = &state.services.storage;

    let health = match storage.exists(STORAGE_CHECK_PATH).await {
        Ok(_) => ComponentHealth::healthy(storage.name()),
        Err(e) => ComponentHealth::unhealthy(format!("{} storage failed: {}", storage.name(), e)),
    };
    health.timed(start_time.elapsed())
}

fn check_bus(state: &AppState) -> ComponentHealth {
    ComponentHealth::healthy(state.services.publisher.name())
}

fn check_providers(state: &AppState) -> ComponentHealth {
    let names = state.services.providers.names();
    if names.is_empty() {
        ComponentHealth::new(HealthStatus::Degraded, "no providers registered")
    } else {
        ComponentHealth::healthy(names.join(", "))
    }
}
