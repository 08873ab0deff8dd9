//! Region-of-interest bounds.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in pixel coordinates marking the tumor
/// candidate region within a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RoiBounds {
    /// X coordinate of the top-left corner
    pub x: u32,
    /// Y coordinate of the top-left corner
    pub y: u32,
    /// Width in pixels (always >= 1)
    pub width: u32,
    /// Height in pixels (always >= 1)
    pub height: u32,
}

impl RoiBounds {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Whether the rectangle lies entirely within an image of the given
    /// dimensions.
    pub fn fits_within(&self, image_width: u32, image_height: u32) -> bool {
        self.width >= 1
            && self.height >= 1
            && self.right() <= image_width
            && self.bottom() <= image_height
    }

    /// Whether the rectangle contains the given pixel coordinate.
    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_within_rejects_out_of_bounds() {
        let roi = RoiBounds::new(10, 10, 20, 20);
        assert!(roi.fits_within(30, 30));
        assert!(!roi.fits_within(29, 30));
        assert!(!roi.fits_within(30, 29));
    }

    #[test]
    fn contains_is_half_open() {
        let roi = RoiBounds::new(5, 5, 10, 10);
        assert!(roi.contains(5, 5));
        assert!(roi.contains(14, 14));
        assert!(!roi.contains(15, 5));
        assert!(!roi.contains(5, 15));
    }
}
