//! Horizontal shear over a transparently padded canvas.

use image::{Rgba, RgbaImage};

use super::crop::pad;

/// Pad by `padding` transparent pixels, then shear horizontally.
///
/// The affine matrix `(1, s, 0, 0, 1, 0)` maps every output pixel back to
/// the source location `(x + s*y, y)`, sampled nearest-neighbour at pixel
/// centres. The output keeps the padded size, so content pushed past the
/// padded bounds is clipped; the caller picks a padding large enough for the
/// shear factor it uses.
pub fn shear(image: &RgbaImage, shear_factor: f64, padding: u32) -> RgbaImage {
    let padded = pad(image, padding);
    let (w, h) = padded.dimensions();

    RgbaImage::from_fn(w, h, |x, y| {
        let src_x = ((x as f64 + 0.5) + shear_factor * (y as f64 + 0.5)).floor();
        if src_x < 0.0 || src_x >= w as f64 {
            Rgba([0, 0, 0, 0])
        } else {
            *padded.get_pixel(src_x as u32, y)
        }
    })
}
