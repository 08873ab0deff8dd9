//! Tumor-candidate region localization.

use image::{imageops, GrayImage, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::contrast::threshold;
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::{dilate, erode};
use tracing::warn;

use nscan_models::RoiBounds;

use crate::error::{ImagingError, ImagingResult};

/// Policy parameters for region localization.
///
/// The defaults reproduce the calibration the screening pipeline was tuned
/// with; each knob can be overridden per deployment (e.g. for a different
/// imaging modality) without a code change.
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Luminance cutoff for binarization: pixels strictly above this value
    /// are foreground.
    pub luma_threshold: u8,
    /// Side length of the Gaussian smoothing kernel. Values below 2
    /// disable smoothing.
    pub smoothing_kernel: u32,
    /// Erosion passes applied before dilation.
    pub erode_iterations: u8,
    /// Dilation passes applied after erosion.
    pub dilate_iterations: u8,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            luma_threshold: 45,
            smoothing_kernel: 5,
            erode_iterations: 2,
            dilate_iterations: 2,
        }
    }
}

impl PreprocessConfig {
    /// Create config from environment variables, falling back to defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            luma_threshold: env_parse("ROI_LUMA_THRESHOLD", defaults.luma_threshold),
            smoothing_kernel: env_parse("ROI_SMOOTHING_KERNEL", defaults.smoothing_kernel),
            erode_iterations: env_parse("ROI_ERODE_ITERS", defaults.erode_iterations),
            dilate_iterations: env_parse("ROI_DILATE_ITERS", defaults.dilate_iterations),
        }
    }

    /// Standard deviation derived from the kernel size, matching the
    /// convention `0.3 * ((k - 1) * 0.5 - 1) + 0.8` used by common
    /// smoothing implementations when sigma is left to auto.
    pub fn smoothing_sigma(&self) -> f32 {
        let k = self.smoothing_kernel as f32;
        (0.3 * ((k - 1.0) * 0.5 - 1.0) + 0.8).max(0.1)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Locates the tumor-candidate region in a decoded scan.
///
/// Pure and deterministic: the same image always yields bit-identical
/// bounds. Internal faults are absorbed into "no region found" so that a
/// valid image can never fail this stage.
#[derive(Debug, Clone, Default)]
pub struct RegionLocator {
    config: PreprocessConfig,
}

impl RegionLocator {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Locate the candidate region, or `None` when no foreground survives
    /// thresholding and opening.
    pub fn locate(&self, image: &RgbImage) -> Option<RoiBounds> {
        match self.try_locate(image) {
            Ok(bounds) => bounds,
            Err(e) => {
                // Fail open: a preprocessing fault reads as "no region".
                warn!("Region localization failed, treating as no region: {e}");
                None
            }
        }
    }

    /// Locate and crop in one step, returning the sub-image of the
    /// original color scan together with its bounds.
    pub fn extract(&self, image: &RgbImage) -> Option<(RgbImage, RoiBounds)> {
        let bounds = self.locate(image)?;
        let crop = imageops::crop_imm(image, bounds.x, bounds.y, bounds.width, bounds.height)
            .to_image();
        Some((crop, bounds))
    }

    fn try_locate(&self, image: &RgbImage) -> ImagingResult<Option<RoiBounds>> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ImagingError::EmptyImage);
        }

        let gray: GrayImage = imageops::grayscale(image);

        // Smoothing needs room for the kernel; tiny images go straight to
        // thresholding.
        let smoothed = if self.config.smoothing_kernel >= 2
            && width.min(height) > self.config.smoothing_kernel
        {
            gaussian_blur_f32(&gray, self.config.smoothing_sigma())
        } else {
            gray
        };

        let mut mask = threshold(&smoothed, self.config.luma_threshold);

        // Opening: erosion clears speck noise, dilation restores the
        // surviving region's extent.
        for _ in 0..self.config.erode_iterations {
            mask = erode(&mask, Norm::LInf, 1);
        }
        for _ in 0..self.config.dilate_iterations {
            mask = dilate(&mask, Norm::LInf, 1);
        }

        let contours: Vec<Contour<i32>> = find_contours(&mask);
        let largest = contours
            .iter()
            .filter(|c| matches!(c.border_type, BorderType::Outer))
            .fold(None::<(&Contour<i32>, i64)>, |best, contour| {
                let area = enclosed_area(contour);
                match best {
                    Some((_, best_area)) if best_area >= area => best,
                    _ => Some((contour, area)),
                }
            });

        let Some((contour, _)) = largest else {
            return Ok(None);
        };

        let bounds = bounding_rect(contour).ok_or_else(|| {
            ImagingError::internal("Contour with no points")
        })?;

        debug_assert!(bounds.fits_within(width, height));
        Ok(Some(bounds))
    }
}

/// Twice the enclosed polygon area via the shoelace formula. Comparing
/// doubled areas avoids fractional arithmetic; degenerate contours (points
/// and lines) enclose zero.
fn enclosed_area(contour: &Contour<i32>) -> i64 {
    let points = &contour.points;
    if points.len() < 3 {
        return 0;
    }
    let mut doubled: i64 = 0;
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        doubled += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    doubled.abs()
}

/// Minimal axis-aligned bounding rectangle of a contour.
fn bounding_rect(contour: &Contour<i32>) -> Option<RoiBounds> {
    let first = contour.points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &contour.points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(RoiBounds::new(
        min_x as u32,
        min_y as u32,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    ))
}
