//! Module endpoints
//!
//! The panel's view onto the install orchestrator: list modules with
//! their live status and gate verdict, query one module, and trigger an
//! install. Install attempts run on their own task; the panel polls
//! status.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::modules::ModuleStatus;
use crate::services::orchestrator::InstallAttempt;
use crate::state::AppState;

pub fn modules_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_modules))
        .route("/installable", get(list_installable))
        .route("/:name", get(get_module))
        .route("/:name/status", get(get_module_status))
        .route("/:name/install", post(install_module))
        .with_state(state)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ModuleResponse {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub order: u32,
    pub dependencies: Vec<String>,
    pub status: ModuleStatus,
    pub installable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ModulesResponse {
    pub modules: Vec<ModuleResponse>,
}

#[derive(Debug, Serialize)]
pub struct ModuleStatusResponse {
    pub module: String,
    pub status: ModuleStatus,
}

#[derive(Debug, Serialize)]
pub struct InstallableResponse {
    pub installable: Vec<String>,
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn module_response(state: &AppState, name: &str) -> Result<ModuleResponse> {
    let module = state.registry.require(name)?;
    let descriptor = module.descriptor();
    let status = state.orchestrator.get_status(name)?;
    let decision = state.orchestrator.can_install(name).await?;

    Ok(ModuleResponse {
        name: descriptor.name.to_string(),
        display_name: descriptor.display_name.to_string(),
        description: descriptor.description.to_string(),
        order: descriptor.order,
        dependencies: descriptor.dependencies.iter().map(|d| d.to_string()).collect(),
        status,
        installable: decision.allowed,
        reason: (!decision.allowed).then_some(decision.reason),
    })
}

/// List all modules in display order with live status and gate verdict
async fn list_modules(State(state): State<AppState>) -> Result<Json<ModulesResponse>> {
    let mut modules = Vec::new();
    for module in state.registry.list_ordered() {
        modules.push(module_response(&state, module.name()).await?);
    }
    Ok(Json(ModulesResponse { modules }))
}

/// Names of modules the gate currently allows, in display order
async fn list_installable(State(state): State<AppState>) -> Json<InstallableResponse> {
    Json(InstallableResponse {
        installable: state.orchestrator.list_installable().await,
    })
}

/// Get a single module
async fn get_module(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ModuleResponse>> {
    Ok(Json(module_response(&state, &name).await?))
}

/// Get a module's current status
async fn get_module_status(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ModuleStatusResponse>> {
    let status = state.orchestrator.get_status(&name)?;
    Ok(Json(ModuleStatusResponse {
        module: name,
        status,
    }))
}

/// Trigger an install attempt
///
/// Returns 202 once the attempt is started on its own task, 409 with the
/// gate's reason when installation is not currently allowed, 404 for
/// unknown module names.
async fn install_module(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse> {
    let decision = state.orchestrator.can_install(&name).await?;
    if !decision.allowed {
        return Err(AppError::Conflict(decision.reason));
    }

    let orchestrator = state.orchestrator.clone();
    let module = name.clone();
    tokio::spawn(async move {
        match orchestrator.request_install(&module).await {
            Ok(InstallAttempt::Finished(report)) => {
                tracing::info!(module = %report.module, status = %report.status, "install attempt finished");
            }
            Ok(InstallAttempt::Denied { reason }) => {
                tracing::info!(module = %module, reason = %reason, "install attempt denied");
            }
            Err(err) => {
                tracing::error!(module = %module, error = %err, "install attempt errored");
            }
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "module": name,
            "status": "installing",
            "message": "install started",
        })),
    ))
}
