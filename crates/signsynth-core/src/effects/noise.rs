//! Additive Gaussian sensor noise.

use image::RgbaImage;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::enhance::to_channel;
use super::EffectError;

/// Add independent `N(mean, std)` noise to every RGB channel of every pixel,
/// clipping to `0..=255`. Alpha is untouched.
///
/// # Errors
///
/// [`EffectError::InvalidParameter`] for a negative or non-finite `std`, or
/// a non-finite `mean`.
pub fn gaussian_noise<R: Rng + ?Sized>(
    image: &RgbaImage,
    mean: f32,
    std: f32,
    rng: &mut R,
) -> Result<RgbaImage, EffectError> {
    // Normal::new flips a negative std instead of rejecting it
    if !mean.is_finite() || !std.is_finite() || std < 0.0 {
        return Err(EffectError::InvalidParameter(format!(
            "gaussian noise needs finite mean and std >= 0, got N({mean}, {std})"
        )));
    }
    let normal = Normal::new(mean, std).map_err(|e| {
        EffectError::InvalidParameter(format!("gaussian noise N({mean}, {std}): {e}"))
    })?;

    let mut output = image.clone();
    for pixel in output.pixels_mut() {
        for c in &mut pixel.0[..3] {
            *c = to_channel(*c as f32 + normal.sample(rng));
        }
    }
    Ok(output)
}
