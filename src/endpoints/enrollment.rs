//! Enrollment endpoints
//!
//! Read-only observation of this kiosk's enrollment: the hardware
//! fingerprint the service keys records by, and the current remote
//! record. Submission itself happens inside the VPN module's install
//! routine.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::services::enrollment::{EnrollmentApi, EnrollmentError, EnrollmentRecord};
use crate::state::AppState;

pub fn enrollment_routes(state: AppState) -> Router {
    Router::new()
        .route("/fingerprint", get(get_fingerprint))
        .route("/status", get(get_enrollment_status))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct FingerprintResponse {
    pub fingerprint: String,
}

/// This machine's hardware fingerprint
async fn get_fingerprint(State(state): State<AppState>) -> Result<Json<FingerprintResponse>> {
    let fingerprint = state.fingerprint.fingerprint()?;
    Ok(Json(FingerprintResponse { fingerprint }))
}

/// Current remote enrollment record for this kiosk
async fn get_enrollment_status(
    State(state): State<AppState>,
) -> Result<Json<EnrollmentRecord>> {
    if !state.enrollment.is_configured() {
        return Err(AppError::ServiceUnavailable(
            "enrollment server not configured".to_string(),
        ));
    }

    let fingerprint = state.fingerprint.fingerprint()?;
    match state.enrollment.poll_status(&fingerprint).await {
        Ok(record) => Ok(Json(record)),
        Err(EnrollmentError::NotFound) => Err(AppError::NotFound(
            "no enrollment record for this kiosk".to_string(),
        )),
        Err(EnrollmentError::Denied(detail)) => Err(AppError::BadRequest(detail)),
        Err(err) => Err(AppError::ServiceUnavailable(err.to_string())),
    }
}
