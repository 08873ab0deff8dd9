//! Classification decision logic.

use std::sync::Arc;

use image::{imageops, RgbImage};
use tracing::warn;

use nscan_models::{ClassificationResult, Verdict};

use crate::error::{ClassifyError, ClassifyResult};
use crate::model::TumorModel;

/// Fixed input side length the tumor model was trained with.
pub const INPUT_SIZE: u32 = 240;

/// Tolerance for the softmax-sums-to-one invariant.
const PROBABILITY_SUM_TOLERANCE: f32 = 1e-4;

/// Produces a binary tumor verdict with confidence from a cropped region.
#[derive(Clone)]
pub struct Classifier {
    model: Arc<dyn TumorModel>,
}

impl Classifier {
    pub fn new(model: Arc<dyn TumorModel>) -> Self {
        Self { model }
    }

    /// Classify a non-absent region of interest.
    ///
    /// The region is resized to the model's fixed input shape before
    /// inference; the winning class becomes the verdict and its
    /// probability mass the confidence. An exact tie resolves to negative
    /// (index 0 wins), matching standard maximum-selection behavior.
    pub fn classify(&self, region: &RgbImage) -> ClassifyResult<ClassificationResult> {
        let resized = imageops::resize(
            region,
            INPUT_SIZE,
            INPUT_SIZE,
            imageops::FilterType::Triangle,
        );

        let probabilities = self.model.infer(&resized)?;

        if !probabilities.negative.is_finite() || !probabilities.positive.is_finite() {
            return Err(ClassifyError::malformed_output(format!(
                "Non-finite probability pair: {probabilities:?}"
            )));
        }
        if (probabilities.sum() - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            warn!(
                "Model probability pair sums to {} instead of 1",
                probabilities.sum()
            );
        }

        let (verdict, winning) = if probabilities.positive > probabilities.negative {
            (Verdict::Positive, probabilities.positive)
        } else {
            (Verdict::Negative, probabilities.negative)
        };

        Ok(ClassificationResult::new(
            verdict,
            f64::from(winning) * 100.0,
        ))
    }
}
