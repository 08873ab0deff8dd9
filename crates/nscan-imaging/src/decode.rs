//! Uploaded scan decoding.

use image::RgbImage;

use crate::error::{ImagingError, ImagingResult};

/// Decode uploaded bytes into a 3-channel RGB pixel grid.
///
/// Accepts any raster format the `image` crate can sniff (PNG, JPEG, BMP,
/// TIFF, ...). Grayscale and alpha inputs are expanded to RGB so the rest
/// of the pipeline only ever sees three channels.
pub fn decode_image(bytes: &[u8]) -> ImagingResult<RgbImage> {
    let decoded = image::load_from_memory(bytes)?;
    let rgb = decoded.to_rgb8();
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(ImagingError::EmptyImage);
    }
    Ok(rgb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn rejects_non_image_bytes() {
        assert!(decode_image(b"definitely not an image").is_err());
    }

    #[test]
    fn decodes_png_to_rgb() {
        let img = RgbImage::from_pixel(8, 8, image::Rgb([10, 20, 30]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Png)
            .unwrap();

        let decoded = decode_image(&buf).unwrap();
        assert_eq!(decoded.dimensions(), (8, 8));
        assert_eq!(decoded.get_pixel(0, 0).0, [10, 20, 30]);
    }
}
