pub mod config;
pub mod errors;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

/// Shared application state passed to all Axum handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: store::RestStore,
    pub config: config::AppConfig,
}
