//! Scan upload and classification handler.

use axum::extract::{Multipart, State};
use axum::Json;
use chrono::Utc;
use image::RgbImage;
use serde::Serialize;
use tracing::{error, info};

use nscan_models::{ClassificationResult, PatientRecord, RoiBounds};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Warning attached to the 200 body when classification succeeded but the
/// record could not be written.
const PERSISTENCE_WARNING: &str = "classification completed but record was not saved";

/// Successful prediction response.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub patient_id: String,
    pub prediction: String,
    pub confidence: String,
    pub name: String,
    pub phone: String,
    pub age: String,
    pub blood_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Patient metadata submitted alongside the scan.
struct PatientFields {
    name: String,
    phone: String,
    age: String,
    blood_type: String,
}

/// `POST /predict`: validate the multipart upload, localize the tumor
/// candidate region, classify it, persist the outcome, and reply with the
/// verdict.
pub async fn predict(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<PredictResponse>> {
    let (bytes, fields) = read_form(multipart).await?;

    // Decode and localization are CPU-bound; keep them off the async
    // executor threads.
    let locator = state.locator.clone();
    let region = tokio::task::spawn_blocking(move || -> ApiResult<_> {
        let image = nscan_imaging::decode_image(&bytes)
            .map_err(|_| ApiError::InvalidImageFormat)?;
        Ok(locator.extract(&image))
    })
    .await
    .map_err(|e| ApiError::internal(format!("Preprocess task failed: {e}")))??;

    let patient_id = state
        .store
        .next_patient_id()
        .await
        .map_err(ApiError::PatientIdGeneration)?;

    let result = classify_region(&state, &patient_id, region).await?;

    let age: i64 = fields
        .age
        .parse()
        .map_err(|_| ApiError::internal(format!("Non-numeric age field: {:?}", fields.age)))?;

    let record = PatientRecord {
        patient_id: patient_id.clone(),
        name: fields.name.clone(),
        phone: fields.phone.clone(),
        age,
        blood_type: fields.blood_type.clone(),
        tumor_result: result.verdict.as_str().to_string(),
        confidence_score: result.confidence_percent(),
        created_at: Utc::now(),
    };

    // Persistence failure is surfaced as a partial success instead of
    // being folded into the happy path.
    let warning = match state.store.insert_record(&record).await {
        Ok(()) => None,
        Err(e) => {
            error!("Failed to persist record {patient_id}: {e}");
            Some(PERSISTENCE_WARNING.to_string())
        }
    };

    Ok(Json(PredictResponse {
        patient_id,
        prediction: result.verdict.as_str().to_string(),
        confidence: result.confidence_percent(),
        name: fields.name,
        phone: fields.phone,
        age: fields.age,
        blood_type: fields.blood_type,
        warning,
    }))
}

/// Pull the scan bytes and metadata fields out of the multipart form,
/// enforcing the upload validation rules.
async fn read_form(mut multipart: Multipart) -> ApiResult<(Vec<u8>, PatientFields)> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut name = String::new();
    let mut phone = String::new();
    let mut age = String::new();
    let mut blood_type = String::new();

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                upload = Some((filename, bytes.to_vec()));
            }
            Some("name") => name = field.text().await?,
            Some("phn") => phone = field.text().await?,
            Some("age") => age = field.text().await?,
            Some("bloodType") => blood_type = field.text().await?,
            _ => {}
        }
    }

    let (filename, bytes) = upload.ok_or(ApiError::NoFileUploaded)?;
    if filename.is_empty() {
        return Err(ApiError::NoSelectedFile);
    }

    let fields = PatientFields {
        name: name.trim().to_string(),
        phone: phone.trim().to_string(),
        age: age.trim().to_string(),
        blood_type: blood_type.trim().to_string(),
    };

    if fields.name.is_empty()
        || fields.phone.is_empty()
        || fields.age.is_empty()
        || fields.blood_type.is_empty()
    {
        return Err(ApiError::MissingPatientFields);
    }

    Ok((bytes, fields))
}

/// Run the classifier over the located region, or apply the fixed
/// no-region policy when localization found nothing.
async fn classify_region(
    state: &AppState,
    patient_id: &str,
    region: Option<(RgbImage, RoiBounds)>,
) -> ApiResult<ClassificationResult> {
    let Some((crop, bounds)) = region else {
        info!("No candidate region for {patient_id}, applying negative policy");
        return Ok(ClassificationResult::no_region_found());
    };

    info!(
        "Classifying {}x{} region at ({}, {}) for {patient_id}",
        bounds.width, bounds.height, bounds.x, bounds.y
    );

    let classifier = state.classifier.clone();
    let result = tokio::task::spawn_blocking(move || classifier.classify(&crop))
        .await
        .map_err(|e| ApiError::internal(format!("Inference task failed: {e}")))??;

    Ok(result)
}
