//! Persisted patient record model.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One row of the patients table: metadata submitted with the scan plus
/// the classification outcome. Records are written once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PatientRecord {
    /// Generated identifier, `P_<NN>` with a monotonically increasing
    /// numeric suffix (widens past two digits).
    pub patient_id: String,

    /// Patient name as submitted.
    pub name: String,

    /// Phone number as submitted (format unvalidated).
    pub phone: String,

    /// Age in years.
    pub age: i64,

    /// Blood type as submitted.
    pub blood_type: String,

    /// Verdict string, `"Tumor +ve"` or `"Tumor -ve"`.
    pub tumor_result: String,

    /// Confidence formatted as a percentage string, e.g. `"97.42%"`.
    pub confidence_score: String,

    /// Insertion timestamp.
    pub created_at: DateTime<Utc>,
}
