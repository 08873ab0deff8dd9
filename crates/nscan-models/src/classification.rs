//! Classification verdict and confidence models.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Binary tumor verdict.
///
/// Serializes to the wire strings the frontend and the patients table use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Verdict {
    #[serde(rename = "Tumor -ve")]
    Negative,
    #[serde(rename = "Tumor +ve")]
    Positive,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Negative => "Tumor -ve",
            Verdict::Positive => "Tumor +ve",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown verdict: {0}")]
pub struct ParseVerdictError(String);

impl FromStr for Verdict {
    type Err = ParseVerdictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Tumor -ve" => Ok(Verdict::Negative),
            "Tumor +ve" => Ok(Verdict::Positive),
            other => Err(ParseVerdictError(other.to_string())),
        }
    }
}

/// A tumor verdict with its confidence percentage.
///
/// `confidence` is the probability mass of the chosen class expressed in
/// [0.0, 100.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClassificationResult {
    pub verdict: Verdict,
    pub confidence: f64,
}

impl ClassificationResult {
    pub fn new(verdict: Verdict, confidence: f64) -> Self {
        Self { verdict, confidence }
    }

    /// Fixed verdict assigned when the preprocessor finds no candidate
    /// region: absence of any detectable region is treated as a negative
    /// by policy, not as a model inference.
    pub fn no_region_found() -> Self {
        Self {
            verdict: Verdict::Negative,
            confidence: 100.0,
        }
    }

    /// Confidence formatted for the wire and the patients table,
    /// e.g. `"97.42%"`.
    pub fn confidence_percent(&self) -> String {
        format!("{:.2}%", self.confidence)
    }
}
