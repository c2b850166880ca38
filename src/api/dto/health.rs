//! Health check DTOs for API responses.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health report for the hub and the adapters it depends on.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "status": "healthy",
    "version": "0.1.0",
    "timestamp": "2024-01-01T12:00:00Z",
    "checks": {
        "bus": { "status": "healthy", "message": "memory" },
        "providers": { "status": "healthy", "message": "log, Sendgrid" },
        "storage": { "status": "healthy", "message": "filesystem", "response_time_ms": 1 }
    }
}))]
pub struct HealthResponse {
    /// Worst status among `checks`
    pub status: HealthStatus,
    #[schema(example = "0.1.0")]
    pub version: String,
    /// Time of the check (RFC 3339)
    #[schema(value_type = String, format = DateTime, example = "2024-01-01T12:00:00Z")]
    pub timestamp: String,
    /// Per-adapter results keyed by adapter (`storage`, `bus`, `providers`)
    pub checks: BTreeMap<String, ComponentHealth>,
}

/// Health status, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Serving, but a dependency is missing or misconfigured
    Degraded,
    Unhealthy,
}

/// Result of checking one adapter.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    /// Backend name, or the failure when unhealthy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Round trip of the check, absent for checks that do no I/O
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
}

impl ComponentHealth {
    pub fn new(status: HealthStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
            response_time_ms: None,
        }
    }

    pub fn healthy(message: impl Into<String>) -> Self {
        Self::new(HealthStatus::Healthy, message)
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::new(HealthStatus::Unhealthy, message)
    }

    pub fn timed(mut self, elapsed: Duration) -> Self {
        self.response_time_ms = Some(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serialization() {
        let json = serde_json::to_string(&HealthStatus::Degraded).unwrap();
        assert_eq!(json, "\"degraded\"");
    }

    #[test]
    fn test_status_ordering() {
        assert!(HealthStatus::Healthy < HealthStatus::Degraded);
        assert!(HealthStatus::Degraded < HealthStatus::Unhealthy);
    }

    #[test]
    fn test_untimed_check_omits_response_time() {
        let value = serde_json::to_value(ComponentHealth::healthy("redis")).unwrap();
        assert_eq!(value, serde_json::json!({ "status": "healthy", "message": "redis" }));

        let timed = ComponentHealth::unhealthy("down").timed(Duration::from_millis(7));
        assert_eq!(timed.response_time_ms, Some(7));
    }
}
