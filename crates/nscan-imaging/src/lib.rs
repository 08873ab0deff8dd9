//! MRI decoding and tumor-candidate region localization.
//!
//! The preprocessing pipeline is classical image processing, no learned
//! components: luminance conversion, Gaussian smoothing, fixed-threshold
//! binarization, morphological opening, then external contour extraction.
//! The largest contour's bounding rectangle becomes the region of interest
//! handed to the classifier.

pub mod decode;
pub mod error;
pub mod preprocess;

pub use decode::decode_image;
pub use error::{ImagingError, ImagingResult};
pub use preprocess::{PreprocessConfig, RegionLocator};
