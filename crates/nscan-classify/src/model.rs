//! ONNX Runtime wrapper for the pre-trained tumor model.

use std::path::Path;
use std::sync::Mutex;

use image::RgbImage;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use tracing::info;

use crate::error::{ClassifyError, ClassifyResult};

/// Two-way softmax output of the tumor model. The pair sums to 1 up to
/// floating-point tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassProbabilities {
    /// Probability of "no tumor" (class index 0).
    pub negative: f32,
    /// Probability of "tumor" (class index 1).
    pub positive: f32,
}

impl ClassProbabilities {
    pub fn new(negative: f32, positive: f32) -> Self {
        Self { negative, positive }
    }

    pub fn sum(&self) -> f32 {
        self.negative + self.positive
    }
}

/// Capability seam for the inference call, so the decision logic and the
/// HTTP layer can be exercised with stub models.
pub trait TumorModel: Send + Sync {
    /// Run the model over an already-resized input region and return the
    /// class probability pair.
    fn infer(&self, region: &RgbImage) -> ClassifyResult<ClassProbabilities>;
}

/// ONNX Runtime-backed tumor model.
///
/// The session is loaded once and shared behind a mutex; inference takes
/// exclusive access for the duration of one run.
#[derive(Debug)]
pub struct OnnxTumorModel {
    session: Mutex<Session>,
    output_name: String,
}

impl OnnxTumorModel {
    /// Load the model artifact from disk. A missing or unreadable artifact
    /// is a startup failure for the hosting process.
    pub fn load(model_path: &Path) -> ClassifyResult<Self> {
        if !model_path.exists() {
            return Err(ClassifyError::ModelNotFound(model_path.to_path_buf()));
        }

        let model_bytes = std::fs::read(model_path)?;

        let session = Session::builder()
            .map_err(|e| ClassifyError::model_load(format!("ORT session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ClassifyError::model_load(format!("ORT opt level: {e}")))?
            .commit_from_memory(model_bytes.as_slice())
            .map_err(|e| ClassifyError::model_load(format!("ORT load model: {e}")))?;

        let output_name = session
            .outputs()
            .first()
            .map(|o| o.name().to_string())
            .ok_or_else(|| ClassifyError::model_load("Model declares no outputs"))?;

        info!(
            "Tumor model loaded from {} (output: {})",
            model_path.display(),
            output_name
        );

        Ok(Self {
            session: Mutex::new(session),
            output_name,
        })
    }
}

impl TumorModel for OnnxTumorModel {
    fn infer(&self, region: &RgbImage) -> ClassifyResult<ClassProbabilities> {
        let tensor = to_nhwc_tensor(region)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ClassifyError::inference("ORT session poisoned"))?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| ClassifyError::inference(format!("ORT run failed: {e}")))?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| ClassifyError::malformed_output("Missing output tensor"))?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifyError::malformed_output(format!("ORT extract: {e}")))?;

        extract_probability_pair(&shape.iter().map(|d| *d as usize).collect::<Vec<_>>(), data)
    }
}

/// Convert an RGB region to an NHWC `(1, H, W, 3)` f32 tensor with channel
/// values rescaled from [0, 255] to [0.0, 1.0].
fn to_nhwc_tensor(region: &RgbImage) -> ClassifyResult<Tensor<f32>> {
    let (w, h) = region.dimensions();
    let mut data: Vec<f32> = Vec::with_capacity((h * w * 3) as usize);
    for pixel in region.pixels() {
        data.push(pixel[0] as f32 / 255.0);
        data.push(pixel[1] as f32 / 255.0);
        data.push(pixel[2] as f32 / 255.0);
    }

    let shape = vec![1usize, h as usize, w as usize, 3];
    Tensor::from_array((shape, data.into_boxed_slice()))
        .map_err(|e| ClassifyError::inference(format!("ORT tensor: {e}")))
}

/// Pull the `(p_negative, p_positive)` pair out of the raw output,
/// accepting `[1, 2]` or `[2]` shapes.
fn extract_probability_pair(shape: &[usize], data: &[f32]) -> ClassifyResult<ClassProbabilities> {
    let valid_shape = matches!(shape, [1, 2] | [2]);
    if !valid_shape || data.len() < 2 {
        return Err(ClassifyError::malformed_output(format!(
            "Expected a two-class probability pair, got shape {shape:?}"
        )));
    }
    Ok(ClassProbabilities::new(data[0], data[1]))
}
