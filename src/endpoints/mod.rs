pub mod enrollment;
pub mod modules;
pub mod settings;

use axum::{extract::State, routing::get, Json, Router};

use crate::state::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new().nest("/api", api_routes(state))
}

/// API routes under /api/*
fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/system", system_routes(state.clone()))
        .nest("/modules", modules::modules_routes(state.clone()))
        .nest("/enrollment", enrollment::enrollment_routes(state.clone()))
        .nest("/settings", settings::settings_routes(state))
}

fn system_routes(state: AppState) -> Router {
    Router::new()
        .route("/version", get(get_version))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Version info endpoint
async fn get_version(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "version": state.config.version,
        "rust_version": "1.83",
        "backend": "rust"
    }))
}
