//! Error types for classification.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for classification operations.
pub type ClassifyResult<T> = Result<T, ClassifyError>;

/// Errors that can occur while loading or running the tumor model.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Model load failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClassifyError {
    pub fn model_load(message: impl Into<String>) -> Self {
        Self::ModelLoad(message.into())
    }

    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }

    pub fn malformed_output(message: impl Into<String>) -> Self {
        Self::MalformedOutput(message.into())
    }
}
