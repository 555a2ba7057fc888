//! Linear enhancements and solid-colour blending.
//!
//! Brightness and contrast follow the classic enhance model: interpolate (or
//! extrapolate) between the image and a degenerate version of it.
//!
//! - Brightness: degenerate = black, so `out = in * factor`
//! - Contrast: degenerate = solid mean luma, so `out = mean + factor * (in - mean)`
//!
//! A factor of 1.0 is the identity, below 1.0 reduces, above 1.0 increases.
//! Only the RGB channels change; alpha is carried through.

use image::{Rgb, RgbaImage};

use crate::luminance::mean_luma;

/// Scale every RGB channel by `factor`.
pub fn brightness(image: &RgbaImage, factor: f32) -> RgbaImage {
    map_rgb(image, |c| c * factor)
}

/// Stretch (or compress) every RGB channel around the image's mean luma.
pub fn contrast(image: &RgbaImage, factor: f32) -> RgbaImage {
    // Degenerate grey is an integer level
    let mean = mean_luma(image).round() as f32;
    map_rgb(image, |c| mean + factor * (c - mean))
}

/// Blend toward a solid colour: `out = in * (1 - ratio) + color * ratio`.
pub fn blend_color(image: &RgbaImage, color: Rgb<u8>, ratio: f32) -> RgbaImage {
    let mut output = image.clone();
    for pixel in output.pixels_mut() {
        for (c, target) in pixel.0[..3].iter_mut().zip(color.0) {
            *c = to_channel(*c as f32 * (1.0 - ratio) + target as f32 * ratio);
        }
    }
    output
}

/// Apply `f` to each RGB channel value (as f32 in `0..=255`).
pub(crate) fn map_rgb(image: &RgbaImage, f: impl Fn(f32) -> f32) -> RgbaImage {
    let mut output = image.clone();
    for pixel in output.pixels_mut() {
        for c in &mut pixel.0[..3] {
            *c = to_channel(f(*c as f32));
        }
    }
    output
}

#[inline]
pub(crate) fn to_channel(v: f32) -> u8 {
    v.clamp(0.0, 255.0).round() as u8
}
