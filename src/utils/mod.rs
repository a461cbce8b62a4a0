//! Utility functions for image handling.

use crate::core::errors::{CareLabelError, CareResult};
use image::{DynamicImage, RgbImage};
use std::path::Path;

/// Converts a DynamicImage to an RgbImage.
pub fn dynamic_to_rgb(img: DynamicImage) -> RgbImage {
    img.to_rgb8()
}

/// Loads an image from a file path and converts it to RgbImage.
///
/// # Errors
///
/// Returns [`CareLabelError::ImageDecode`] if the file cannot be opened or
/// decoded; the caller treats this as a retryable analysis failure.
pub fn load_image(path: &Path) -> CareResult<RgbImage> {
    let img = image::open(path).map_err(CareLabelError::ImageDecode)?;
    Ok(dynamic_to_rgb(img))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::io::Write;

    #[test]
    fn loads_a_valid_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label.png");
        RgbImage::from_pixel(8, 8, Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();

        let img = load_image(&path).unwrap();
        assert_eq!(img.dimensions(), (8, 8));
        assert_eq!(img.get_pixel(0, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn corrupt_file_surfaces_as_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label.jpg");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"not an image").unwrap();

        let error = load_image(&path).unwrap_err();
        assert!(matches!(error, CareLabelError::ImageDecode(_)));
        assert!(error.is_retryable());
    }

    #[test]
    fn missing_file_surfaces_as_decode_error() {
        let error = load_image(Path::new("/nonexistent/label.jpg")).unwrap_err();
        assert!(error.is_retryable());
    }
}
