//! Tumor classification over cropped MRI regions.
//!
//! The model is a pre-trained two-class network exported to ONNX; it is
//! loaded once at process start and injected into the [`Classifier`] as a
//! [`TumorModel`] capability, never reached as an ambient global. The
//! classifier owns resizing, rescaling, and the argmax decision rule; the
//! model owns tensor layout and the inference call.

pub mod classifier;
pub mod error;
pub mod model;

pub use classifier::{Classifier, INPUT_SIZE};
pub use error::{ClassifyError, ClassifyResult};
pub use model::{ClassProbabilities, OnnxTumorModel, TumorModel};
