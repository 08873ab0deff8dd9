//! Patient record lookup handlers.

use axum::extract::{Path, State};
use axum::Json;

use nscan_models::PatientRecord;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Fetch one persisted classification record by patient identifier.
pub async fn get_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> ApiResult<Json<PatientRecord>> {
    let record = state
        .store
        .fetch_record(&patient_id)
        .await?
        .ok_or(ApiError::PatientNotFound)?;

    Ok(Json(record))
}
