//! Settings endpoints
//!
//! Dotted-key access to the persistent settings store. The `modules`
//! namespace is orchestrator-owned and cannot be written through this
//! surface.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Create settings routes
pub fn settings_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_settings))
        .route("/:key", get(get_setting).put(update_setting))
        .with_state(state)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SettingResponse {
    pub key: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct SettingUpdate {
    pub value: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub settings: serde_json::Value,
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

/// Full settings tree
async fn list_settings(State(state): State<AppState>) -> Json<SettingsResponse> {
    Json(SettingsResponse {
        settings: state.settings.snapshot(),
    })
}

/// Get a setting by dotted key
async fn get_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<SettingResponse>> {
    let value = state
        .settings
        .get(&key)
        .ok_or_else(|| AppError::NotFound(format!("Setting '{}' not found", key)))?;

    Ok(Json(SettingResponse { key, value }))
}

/// Update a setting by dotted key and persist immediately
async fn update_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(data): Json<SettingUpdate>,
) -> Result<Json<SettingResponse>> {
    if key == "modules" || key.starts_with("modules.") {
        return Err(AppError::BadRequest(
            "module status is managed by the installer and cannot be set directly".to_string(),
        ));
    }

    state.settings.set(&key, data.value.clone());
    state.settings.persist()?;

    Ok(Json(SettingResponse {
        key,
        value: data.value,
    }))
}
