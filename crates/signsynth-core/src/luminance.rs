//! Luma calculation using ITU-R BT.601 coefficients.
//!
//! This is the weighting behind the classic 8-bit "L" greyscale conversion,
//! which the contrast enhancement uses to find the image's mean grey level.

use image::RgbaImage;

/// ITU-R BT.601 coefficient for red channel in luma calculation.
pub const LUMA_R: f32 = 0.299;

/// ITU-R BT.601 coefficient for green channel in luma calculation.
pub const LUMA_G: f32 = 0.587;

/// ITU-R BT.601 coefficient for blue channel in luma calculation.
pub const LUMA_B: f32 = 0.114;

/// Calculate luma from u8 RGB values (0 to 255).
#[inline]
pub fn calculate_luma_u8(r: u8, g: u8, b: u8) -> u8 {
    let luma = LUMA_R * r as f32 + LUMA_G * g as f32 + LUMA_B * b as f32;
    luma.clamp(0.0, 255.0).round() as u8
}

/// Mean 8-bit luma over every pixel of the image, alpha ignored.
///
/// Returns 0.0 for an empty image.
pub fn mean_luma(image: &RgbaImage) -> f64 {
    let count = image.width() as u64 * image.height() as u64;
    if count == 0 {
        return 0.0;
    }
    let total: u64 = image
        .pixels()
        .map(|p| calculate_luma_u8(p[0], p[1], p[2]) as u64)
        .sum();
    total as f64 / count as f64
}
