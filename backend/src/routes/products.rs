//! Product catalog routes: browsing, barcode lookup and stock location edits.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::errors::{ApiResponse, AppError};
use crate::models::product::{
    entity_id_from_text, EntityId, NewProduct, NewStockLocation, Product, SetQuantity,
    StockLocationPatch,
};
use crate::services::catalog::{self, ProductFilters, SortOption};
use crate::services::stock;
use crate::AppState;

/// Acting warehouseman for edits that carry no body.
#[derive(Debug, Clone, Deserialize)]
pub struct EditorQuery {
    #[serde(deserialize_with = "entity_id_from_text")]
    pub warehouseman_id: EntityId,
}

/// GET /api/v1/products — list products with search, filters and sorting.
pub async fn list(
    State(state): State<AppState>,
    Query(filters): Query<ProductFilters>,
    Query(sort): Query<SortOption>,
) -> Result<Json<ApiResponse<Vec<Product>>>, AppError> {
    let products = state.store.fetch_all_products().await?;
    let result = catalog::filter_products(&products, &filters, sort)?;
    Ok(ApiResponse::success(result))
}

/// POST /api/v1/products — register a new product.
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewProduct>,
) -> Result<Json<ApiResponse<Product>>, AppError> {
    let product = catalog::build_product(&body, Utc::now())?;
    let created = state.store.create_product(&product).await?;
    tracing::info!(product_id = %created.id, "Product created");
    Ok(ApiResponse::success(created))
}

/// GET /api/v1/products/{id} — get product by ID.
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Product>>, AppError> {
    let product = state.store.fetch_product(&EntityId::parse(&id)).await?;
    Ok(ApiResponse::success(product))
}

/// GET /api/v1/products/barcode/{code} — get product by scanned barcode.
pub async fn get_by_barcode(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<Product>>, AppError> {
    let product = state
        .store
        .find_by_barcode(&code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product with barcode '{code}' not found")))?;
    Ok(ApiResponse::success(product))
}

/// PUT /api/v1/products/{id}/stocks/{stock_id} — set the quantity at a location.
pub async fn set_quantity(
    State(state): State<AppState>,
    Path((id, stock_id)): Path<(String, String)>,
    Json(body): Json<SetQuantity>,
) -> Result<Json<ApiResponse<Product>>, AppError> {
    let product = state.store.fetch_product(&EntityId::parse(&id)).await?;
    let stock_id = EntityId::parse(&stock_id);
    let updated = stock::set_quantity(
        &product,
        &stock_id,
        body.quantity,
        &body.warehouseman_id,
        Utc::now(),
    );
    let saved = state.store.update_product(&updated).await?;
    tracing::info!(
        product_id = %saved.id,
        stock_id = %stock_id,
        quantity = body.quantity,
        "Stock quantity updated"
    );
    Ok(ApiResponse::success(saved))
}

/// POST /api/v1/products/{id}/stocks — add a stock location.
pub async fn add_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<NewStockLocation>,
) -> Result<Json<ApiResponse<Product>>, AppError> {
    let product = state.store.fetch_product(&EntityId::parse(&id)).await?;
    let updated = stock::add_location(&product, &body, Utc::now())?;
    let saved = state.store.update_product(&updated).await?;
    tracing::info!(product_id = %saved.id, city = %body.city, "Stock location added");
    Ok(ApiResponse::success(saved))
}

/// PATCH /api/v1/products/{id}/stocks/{stock_id} — modify a stock location.
pub async fn modify_location(
    State(state): State<AppState>,
    Path((id, stock_id)): Path<(String, String)>,
    Json(body): Json<StockLocationPatch>,
) -> Result<Json<ApiResponse<Product>>, AppError> {
    let product = state.store.fetch_product(&EntityId::parse(&id)).await?;
    let updated =
        stock::modify_location(&product, &EntityId::parse(&stock_id), &body, Utc::now())?;
    let saved = state.store.update_product(&updated).await?;
    tracing::info!(product_id = %saved.id, stock_id = %stock_id, "Stock location modified");
    Ok(ApiResponse::success(saved))
}

/// DELETE /api/v1/products/{id}/stocks/{stock_id} — remove a stock location.
pub async fn remove_location(
    State(state): State<AppState>,
    Path((id, stock_id)): Path<(String, String)>,
    Query(editor): Query<EditorQuery>,
) -> Result<Json<ApiResponse<Product>>, AppError> {
    let product = state.store.fetch_product(&EntityId::parse(&id)).await?;
    let updated = stock::remove_location(
        &product,
        &EntityId::parse(&stock_id),
        &editor.warehouseman_id,
        Utc::now(),
    )?;
    let saved = state.store.update_product(&updated).await?;
    tracing::info!(product_id = %saved.id, stock_id = %stock_id, "Stock location removed");
    Ok(ApiResponse::success(saved))
}
