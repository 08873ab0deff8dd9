//! Error types for imaging operations.

use thiserror::Error;

/// Result type for imaging operations.
pub type ImagingResult<T> = Result<T, ImagingError>;

/// Errors that can occur while decoding or preprocessing a scan.
#[derive(Debug, Error)]
pub enum ImagingError {
    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image has zero width or height")]
    EmptyImage,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ImagingError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
