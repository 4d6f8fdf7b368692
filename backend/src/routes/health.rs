//! Health check endpoints for liveness and readiness checks.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::ApiResponse;
use crate::AppState;

/// Readiness check detail.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub store: String,
}

/// Liveness check — always returns OK if the process is running.
pub async fn live() -> &'static str {
    "OK"
}

/// Readiness check — confirms that the data store answers.
pub async fn ready(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    let store_status = match state.store.ping().await {
        Ok(()) => "connected".to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Data store health check failed");
            format!("error: {e}")
        }
    };

    ApiResponse::success(HealthStatus {
        status: "ok".to_string(),
        store: store_status,
    })
}
