//! Overlay rotation with bilinear and bicubic interpolation.
//!
//! The canvas always expands to contain the whole rotated overlay; the area
//! uncovered by the rotation is fully transparent.
//!
//! # Algorithm
//!
//! The rotation uses inverse mapping: for each pixel in the output image,
//! we calculate which source pixel(s) contribute to it and interpolate
//! their values. Coordinates are taken at pixel centres.
//!
//! For rotation by angle θ, the inverse transform is:
//! ```text
//! src_x = (dst_x - cx) * cos(-θ) - (dst_y - cy) * sin(-θ) + src_cx
//! src_y = (dst_x - cx) * sin(-θ) + (dst_y - cy) * cos(-θ) + src_cy
//! ```
//!
//! Taps that fall outside the source contribute a transparent texel, so the
//! edges of the overlay fade into the surrounding alpha instead of smearing.

use image::{Rgba, RgbaImage};
use rand::Rng;

use super::TransformError;

/// Interpolation filter for rotation operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationFilter {
    /// 2x2 neighbourhood, fast.
    Bilinear,
    /// 4x4 Keys cubic convolution (a = -0.5), the usual "bicubic" resample.
    #[default]
    Bicubic,
}

/// Compute the dimensions of the bounding box for a rotated image.
///
/// When an image is rotated, the corners extend beyond the original bounds.
/// This function calculates the minimum bounding box that contains the
/// entire rotated image.
///
/// # Arguments
///
/// * `width` - Original image width
/// * `height` - Original image height
/// * `angle_degrees` - Rotation angle in degrees (positive = counter-clockwise)
///
/// # Returns
///
/// Tuple of (new_width, new_height) for the rotated bounding box.
pub fn compute_rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    let angle_normalized = angle_degrees % 360.0;

    if angle_normalized.abs() < 0.001 || (360.0 - angle_normalized.abs()).abs() < 0.001 {
        return (width, height);
    }

    // Quarter turns swap dimensions exactly
    let abs_angle = angle_normalized.abs();
    if (abs_angle - 90.0).abs() < 0.001 || (abs_angle - 270.0).abs() < 0.001 {
        return (height, width);
    }

    if (abs_angle - 180.0).abs() < 0.001 {
        return (width, height);
    }

    let angle_rad = angle_degrees.to_radians();
    let cos = angle_rad.cos().abs();
    let sin = angle_rad.sin().abs();

    let w = width as f64;
    let h = height as f64;

    // new_w = |w*cos| + |h*sin|
    // new_h = |w*sin| + |h*cos|
    let new_w = (w * cos + h * sin).ceil() as u32;
    let new_h = (w * sin + h * cos).ceil() as u32;

    (new_w.max(1), new_h.max(1))
}

/// Rotate by an angle drawn uniformly from `[min_degrees, max_degrees]`.
///
/// Uses bicubic interpolation and an expanded canvas.
pub fn random_rotate<R: Rng + ?Sized>(
    image: &RgbaImage,
    min_degrees: f64,
    max_degrees: f64,
    rng: &mut R,
) -> Result<RgbaImage, TransformError> {
    if min_degrees.is_nan() || max_degrees.is_nan() || min_degrees > max_degrees {
        return Err(TransformError::InvalidRange {
            min: min_degrees,
            max: max_degrees,
        });
    }
    let angle = rng.random_range(min_degrees..=max_degrees);
    tracing::trace!(angle, "rotating overlay");
    Ok(apply_rotation(image, angle, InterpolationFilter::Bicubic))
}

/// Apply rotation to an image.
///
/// The image is rotated around its center. The output canvas is expanded
/// to fit the entire rotated image (no clipping) and newly exposed pixels
/// are transparent.
pub fn apply_rotation(
    image: &RgbaImage,
    angle_degrees: f64,
    filter: InterpolationFilter,
) -> RgbaImage {
    if angle_degrees.abs() < 0.001 {
        return image.clone();
    }

    let (src_w, src_h) = (image.width() as f64, image.height() as f64);
    let (dst_w, dst_h) = compute_rotated_bounds(image.width(), image.height(), angle_degrees);

    // Negate angle for correct visual rotation direction
    // (positive angle should rotate counter-clockwise visually)
    let angle_rad = -angle_degrees.to_radians();
    let cos = angle_rad.cos();
    let sin = angle_rad.sin();

    let src_cx = src_w / 2.0;
    let src_cy = src_h / 2.0;
    let dst_cx = dst_w as f64 / 2.0;
    let dst_cy = dst_h as f64 / 2.0;

    RgbaImage::from_fn(dst_w, dst_h, |dst_x, dst_y| {
        let dx = dst_x as f64 + 0.5 - dst_cx;
        let dy = dst_y as f64 + 0.5 - dst_cy;

        // Back to pixel-index space of the source
        let src_x = dx * cos - dy * sin + src_cx - 0.5;
        let src_y = dx * sin + dy * cos + src_cy - 0.5;

        match filter {
            InterpolationFilter::Bilinear => sample_bilinear(image, src_x, src_y),
            InterpolationFilter::Bicubic => sample_bicubic(image, src_x, src_y),
        }
    })
}

/// Fetch a texel as `[f64; 4]`, transparent black outside the image.
#[inline]
fn texel(image: &RgbaImage, x: i64, y: i64) -> [f64; 4] {
    if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        return [0.0; 4];
    }
    let p = image.get_pixel(x as u32, y as u32).0;
    [p[0] as f64, p[1] as f64, p[2] as f64, p[3] as f64]
}

#[inline]
fn to_pixel(acc: [f64; 4]) -> Rgba<u8> {
    Rgba(acc.map(|v| v.clamp(0.0, 255.0).round() as u8))
}

/// Sample a pixel using bilinear interpolation.
fn sample_bilinear(image: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let (w, h) = (image.width() as i64, image.height() as i64);
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    // Entire 2x2 footprint outside the source
    if x0 < -1 || y0 < -1 || x0 >= w || y0 >= h {
        return Rgba([0, 0, 0, 0]);
    }

    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = texel(image, x0, y0);
    let p10 = texel(image, x0 + 1, y0);
    let p01 = texel(image, x0, y0 + 1);
    let p11 = texel(image, x0 + 1, y0 + 1);

    let mut acc = [0.0f64; 4];
    for (i, v) in acc.iter_mut().enumerate() {
        *v = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
    }
    to_pixel(acc)
}

/// Sample a pixel using bicubic (Keys) interpolation over a 4x4 neighbourhood.
fn sample_bicubic(image: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let (w, h) = (image.width() as i64, image.height() as i64);
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    if x0 < -2 || y0 < -2 || x0 > w || y0 > h {
        return Rgba([0, 0, 0, 0]);
    }

    let mut wx = [0.0f64; 4];
    let mut wy = [0.0f64; 4];
    for k in 0..4 {
        wx[k] = cubic_weight(x - (x0 - 1 + k as i64) as f64);
        wy[k] = cubic_weight(y - (y0 - 1 + k as i64) as f64);
    }

    let mut acc = [0.0f64; 4];
    for (ky, weight_y) in wy.iter().enumerate() {
        for (kx, weight_x) in wx.iter().enumerate() {
            let weight = weight_x * weight_y;
            let p = texel(image, x0 - 1 + kx as i64, y0 - 1 + ky as i64);
            for i in 0..4 {
                acc[i] += p[i] * weight;
            }
        }
    }
    to_pixel(acc)
}

/// Keys cubic convolution kernel with `a = -0.5`.
///
/// ```text
/// W(t) = (a+2)|t|^3 - (a+3)|t|^2 + 1        for |t| < 1
/// W(t) = a|t|^3 - 5a|t|^2 + 8a|t| - 4a      for 1 <= |t| < 2
/// W(t) = 0                                  otherwise
/// ```
fn cubic_weight(t: f64) -> f64 {
    const A: f64 = -0.5;
    let t = t.abs();
    if t < 1.0 {
        ((A + 2.0) * t - (A + 3.0)) * t * t + 1.0
    } else if t < 2.0 {
        ((A * t - 5.0 * A) * t + 8.0 * A) * t - 4.0 * A
    } else {
        0.0
    }
}
