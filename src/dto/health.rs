use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Number of scoring sessions currently open.
    pub open_sessions: usize,
}

impl HealthResponse {
    /// Create a health response indicating the record store is reachable.
    pub fn ok(open_sessions: usize) -> Self {
        Self {
            status: "ok".to_string(),
            open_sessions,
        }
    }

    /// Create a health response indicating the system is in degraded mode.
    pub fn degraded(open_sessions: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            open_sessions,
        }
    }
}
