//! Radial lens distortions: pincushion and barrel.
//!
//! Both are inverse maps over the output canvas, with offsets measured from
//! the canvas centre. They differ in how they treat source coordinates that
//! fall off the canvas:
//!
//! - pincushion wraps them modulo the canvas size
//! - barrel leaves the output pixel transparent
//!
//! Per-column offsets are computed once and shared across rows.

use image::{Rgba, RgbaImage};

use super::crop::pad;

/// Pad transparently, then pull pixels toward the centre.
///
/// For each output pixel with centre offset `(dx, dy)` and
/// `r = |(dx, dy)| * strength`, the source is `(x - dx*r, y - dy*r)`
/// wrapped modulo the canvas dimensions.
pub fn pincushion(image: &RgbaImage, padding: u32, strength: f64) -> RgbaImage {
    let padded = pad(image, padding);
    let (w, h) = padded.dimensions();
    let cx = w as f64 / 2.0;
    let cy = h as f64 / 2.0;

    let column_offsets: Vec<f64> = (0..w).map(|x| x as f64 - cx).collect();
    let mut output = RgbaImage::new(w, h);

    for (x, y, pixel) in output.enumerate_pixels_mut() {
        let dx = column_offsets[x as usize];
        let dy = y as f64 - cy;
        let r = (dx * dx + dy * dy).sqrt() * strength;

        let src_x = wrap(x as f64 - dx * r, w);
        let src_y = wrap(y as f64 - dy * r, h);
        *pixel = *padded.get_pixel(src_x, src_y);
    }

    output
}

/// Push pixels outward by remapping the radial distance.
///
/// Each output pixel at polar `(distance, angle)` around the centre samples
/// the source at `distance + amount * distance^2` along the same angle.
/// Samples that leave the canvas produce a transparent pixel.
pub fn barrel(image: &RgbaImage, amount: f64) -> RgbaImage {
    let (w, h) = image.dimensions();
    let cx = w as f64 / 2.0;
    let cy = h as f64 / 2.0;

    let column_offsets: Vec<f64> = (0..w).map(|x| x as f64 - cx).collect();
    let mut output = RgbaImage::new(w, h);

    for (x, y, pixel) in output.enumerate_pixels_mut() {
        let dx = column_offsets[x as usize];
        let dy = y as f64 - cy;
        let distance = (dx * dx + dy * dy).sqrt();
        let angle = dy.atan2(dx);

        let distorted = distance + amount * distance * distance;
        // Truncation toward zero, not floor
        let src_x = (cx + distorted * angle.cos()).trunc();
        let src_y = (cy + distorted * angle.sin()).trunc();

        if src_x >= 0.0 && src_x < w as f64 && src_y >= 0.0 && src_y < h as f64 {
            *pixel = *image.get_pixel(src_x as u32, src_y as u32);
        } else {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    output
}

/// `v mod len` into `0..len`.
#[inline]
fn wrap(v: f64, len: u32) -> u32 {
    // rem_euclid can round up to exactly `len` for tiny negative inputs
    (v.rem_euclid(len as f64) as u32).min(len.saturating_sub(1))
}
