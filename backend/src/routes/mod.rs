//! Route definitions for the Stockpulse API.

pub mod dashboard;
pub mod health;
pub mod products;
pub mod warehousemen;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let dashboard_routes = Router::new().route("/dashboard/stats", get(dashboard::stats));

    let product_routes = Router::new()
        .route("/products", get(products::list).post(products::create))
        .route("/products/barcode/{code}", get(products::get_by_barcode))
        .route("/products/{id}", get(products::get_by_id))
        .route("/products/{id}/stocks", post(products::add_location))
        .route(
            "/products/{id}/stocks/{stock_id}",
            put(products::set_quantity)
                .patch(products::modify_location)
                .delete(products::remove_location),
        );

    let warehouseman_routes = Router::new().route("/warehousemen", get(warehousemen::list));

    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/api/v1", dashboard_routes)
        .nest("/api/v1", product_routes)
        .nest("/api/v1", warehouseman_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
