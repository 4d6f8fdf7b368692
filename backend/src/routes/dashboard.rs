//! Dashboard routes: aggregated stock statistics for the overview screen.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::errors::{ApiResponse, AppError};
use crate::services::dashboard::{self, DashboardOptions, DashboardSummary};
use crate::AppState;

/// Optional per-request overrides of the configured window and ranking size.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    pub window_days: Option<u32>,
    pub top_n: Option<usize>,
}

/// GET /api/v1/dashboard/stats — aggregated dashboard statistics.
pub async fn stats(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<ApiResponse<DashboardSummary>>, AppError> {
    let options = DashboardOptions {
        window_days: query
            .window_days
            .unwrap_or(state.config.dashboard_window_days),
        top_n: query.top_n.unwrap_or(state.config.dashboard_top_n),
    };
    let stats = dashboard::get_stats(&state.store, Utc::now(), options).await?;
    Ok(ApiResponse::success(stats))
}
