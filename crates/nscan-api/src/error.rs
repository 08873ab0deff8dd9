//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No file uploaded")]
    NoFileUploaded,

    #[error("No selected file")]
    NoSelectedFile,

    #[error("All patient information fields are required")]
    MissingPatientFields,

    #[error("Invalid image format")]
    InvalidImageFormat,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Failed to generate patient ID: {0}")]
    PatientIdGeneration(#[source] nscan_store::StoreError),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Classification error: {0}")]
    Classify(#[from] nscan_classify::ClassifyError),

    #[error("Store error: {0}")]
    Store(#[from] nscan_store::StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NoFileUploaded
            | ApiError::NoSelectedFile
            | ApiError::MissingPatientFields
            | ApiError::InvalidImageFormat => StatusCode::BAD_REQUEST,
            ApiError::PatientNotFound => StatusCode::NOT_FOUND,
            ApiError::PatientIdGeneration(_)
            | ApiError::Multipart(_)
            | ApiError::Classify(_)
            | ApiError::Store(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Wire message. Validation errors carry their specific reason;
    /// everything server-side collapses to a fixed phrase so no internal
    /// detail leaks to the caller.
    fn public_message(&self) -> String {
        match self {
            ApiError::NoFileUploaded
            | ApiError::NoSelectedFile
            | ApiError::MissingPatientFields
            | ApiError::InvalidImageFormat
            | ApiError::PatientNotFound => self.to_string(),
            ApiError::PatientIdGeneration(_) => "Failed to generate patient ID".to_string(),
            ApiError::Multipart(_)
            | ApiError::Classify(_)
            | ApiError::Store(_)
            | ApiError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!("Request failed: {self}");
        }

        let body = ErrorResponse {
            error: self.public_message(),
        };

        (status, Json(body)).into_response()
    }
}
