//! Exact-size resampling for backgrounds and placed overlays.
//!
//! Thin wrapper over the `image` crate's resamplers. All functions return a
//! new image without modifying the input.

use image::{imageops, RgbaImage};
use serde::{Deserialize, Serialize};

use super::TransformError;

/// Filter type for resize operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Nearest neighbor interpolation (fastest, lowest quality).
    Nearest,
    /// Bilinear interpolation.
    Bilinear,
    /// Catmull-Rom bicubic interpolation.
    #[default]
    Bicubic,
    /// Lanczos3 interpolation (slowest, sharpest).
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> imageops::FilterType {
        match self {
            FilterType::Nearest => imageops::FilterType::Nearest,
            FilterType::Bilinear => imageops::FilterType::Triangle,
            FilterType::Bicubic => imageops::FilterType::CatmullRom,
            FilterType::Lanczos3 => imageops::FilterType::Lanczos3,
        }
    }
}

/// Resize an image to exact dimensions.
///
/// # Errors
///
/// Returns [`TransformError::InvalidDimensions`] if either target dimension
/// is zero.
pub fn resize(
    image: &RgbaImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<RgbaImage, TransformError> {
    if width == 0 || height == 0 {
        return Err(TransformError::InvalidDimensions { width, height });
    }

    // Fast path: if dimensions match, just clone
    if image.dimensions() == (width, height) {
        return Ok(image.clone());
    }

    Ok(imageops::resize(image, width, height, filter.to_image_filter()))
}

/// Resize to a `side x side` square, ignoring the source aspect ratio.
pub fn resize_square(
    image: &RgbaImage,
    side: u32,
    filter: FilterType,
) -> Result<RgbaImage, TransformError> {
    resize(image, side, side, filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn create_test_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([((x * 255) / width.max(1)) as u8, ((y * 255) / height.max(1)) as u8, 128, 255])
        })
    }

    #[test]
    fn test_resize_exact_dimensions() {
        let img = create_test_image(100, 80);
        let resized = resize(&img, 50, 40, FilterType::Bilinear).unwrap();
        assert_eq!(resized.dimensions(), (50, 40));
    }

    #[test]
    fn test_resize_same_dimensions_is_clone() {
        let img = create_test_image(30, 20);
        let resized = resize(&img, 30, 20, FilterType::Lanczos3).unwrap();
        assert_eq!(resized, img);
    }

    #[test]
    fn test_resize_zero_dimension_errors() {
        let img = create_test_image(10, 10);
        assert!(matches!(
            resize(&img, 0, 10, FilterType::Nearest),
            Err(TransformError::InvalidDimensions { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_resize_square_ignores_aspect_ratio() {
        let img = create_test_image(200, 50);
        let resized = resize_square(&img, 64, FilterType::Bicubic).unwrap();
        assert_eq!(resized.dimensions(), (64, 64));
    }

    #[test]
    fn test_resize_keeps_opaque_alpha() {
        let img = create_test_image(40, 40);
        let resized = resize(&img, 17, 23, FilterType::Bicubic).unwrap();
        assert!(resized.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn test_filter_type_conversion() {
        assert!(matches!(
            FilterType::Nearest.to_image_filter(),
            imageops::FilterType::Nearest
        ));
        assert!(matches!(
            FilterType::Bilinear.to_image_filter(),
            imageops::FilterType::Triangle
        ));
        assert!(matches!(
            FilterType::Bicubic.to_image_filter(),
            imageops::FilterType::CatmullRom
        ));
    }
}
