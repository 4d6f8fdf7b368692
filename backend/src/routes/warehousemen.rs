//! Warehouseman directory routes.

use axum::{extract::State, Json};

use crate::errors::{ApiResponse, AppError};
use crate::models::warehouseman::Warehouseman;
use crate::AppState;

/// GET /api/v1/warehousemen — list warehousemen.
pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Warehouseman>>>, AppError> {
    let warehousemen = state.store.fetch_warehousemen().await?;
    Ok(ApiResponse::success(warehousemen))
}
