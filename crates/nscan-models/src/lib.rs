//! Shared data models for the NeuroScan backend.
//!
//! This crate provides Serde-serializable types for:
//! - Tumor classification verdicts and confidence
//! - Region-of-interest bounds produced by the preprocessor
//! - Persisted patient records

pub mod classification;
pub mod patient;
pub mod roi;

// Re-export common types
pub use classification::{ClassificationResult, ParseVerdictError, Verdict};
pub use patient::PatientRecord;
pub use roi::RoiBounds;
