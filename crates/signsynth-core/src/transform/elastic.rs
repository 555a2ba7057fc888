//! Elastic deformation: smooth, spatially-correlated random displacement.
//!
//! Two displacement fields of uniform noise in `[-1, 1]` are smoothed with a
//! Gaussian and scaled, then every output pixel samples the source at its
//! displaced position (nearest neighbour, mirrored at the borders). Both the
//! smoothing scale and the magnitude are fractions of the image width, so the
//! effect looks the same at any resolution.

use image::{ImageBuffer, Luma, RgbaImage};
use imageproc::filter::gaussian_blur_f32;
use rand::Rng;

use super::TransformError;

/// Parameters for [`elastic`], relative to image width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElasticParams {
    /// Displacement magnitude, multiplied by width.
    pub alpha: f64,
    /// Gaussian smoothing sigma, multiplied by width.
    pub sigma: f64,
}

impl Default for ElasticParams {
    fn default() -> Self {
        Self {
            alpha: 2.0,
            sigma: 0.06,
        }
    }
}

type Field = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Warp the image with a random smooth displacement field.
///
/// The output has the same dimensions as the input.
///
/// # Errors
///
/// [`TransformError::InvalidParameter`] if the effective sigma is not
/// strictly positive.
pub fn elastic<R: Rng + ?Sized>(
    image: &RgbaImage,
    params: ElasticParams,
    rng: &mut R,
) -> Result<RgbaImage, TransformError> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return Ok(image.clone());
    }

    let sigma = (params.sigma * w as f64) as f32;
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(TransformError::InvalidParameter(format!(
            "elastic sigma must be positive, got {sigma}"
        )));
    }
    let alpha = params.alpha * w as f64;

    let dx = displacement_field(w, h, sigma, alpha, rng);
    let dy = displacement_field(w, h, sigma, alpha, rng);

    Ok(RgbaImage::from_fn(w, h, |x, y| {
        let i = (y * w + x) as usize;
        let src_x = reflect((x as f64 + dx[i]).round() as i64, w);
        let src_y = reflect((y as f64 + dy[i]).round() as i64, h);
        *image.get_pixel(src_x, src_y)
    }))
}

fn displacement_field<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    sigma: f32,
    alpha: f64,
    rng: &mut R,
) -> Vec<f64> {
    let noise: Field = ImageBuffer::from_fn(width, height, |_, _| {
        Luma([rng.random_range(-1.0f32..=1.0)])
    });
    gaussian_blur_f32(&noise, sigma)
        .into_raw()
        .into_iter()
        .map(|v| v as f64 * alpha)
        .collect()
}

/// Mirror `v` into `0..len` (`d c b a | a b c d | d c b a`).
#[inline]
fn reflect(v: i64, len: u32) -> u32 {
    let len = len as i64;
    let m = v.rem_euclid(2 * len);
    (if m >= len { 2 * len - 1 - m } else { m }) as u32
}
