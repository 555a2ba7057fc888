//! Solid occluder patches.

use image::{Rgba, RgbaImage};
use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};
use rand::Rng;

use super::TransformError;

/// Opaque black used for occluders.
pub const OCCLUDER_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Paint an opaque black `occlusion_width x occlusion_height` patch at a
/// uniformly random position where it fits entirely inside the image.
///
/// A zero-sized patch leaves the image untouched.
///
/// # Errors
///
/// [`TransformError::OcclusionTooLarge`] if the patch exceeds the image in
/// either dimension.
pub fn occlude<R: Rng + ?Sized>(
    image: &RgbaImage,
    occlusion_width: u32,
    occlusion_height: u32,
    rng: &mut R,
) -> Result<RgbaImage, TransformError> {
    let (width, height) = image.dimensions();
    if occlusion_width > width || occlusion_height > height {
        return Err(TransformError::OcclusionTooLarge {
            occlusion_width,
            occlusion_height,
            width,
            height,
        });
    }

    let mut occluded = image.clone();
    if occlusion_width == 0 || occlusion_height == 0 {
        return Ok(occluded);
    }

    let x = rng.random_range(0..=width - occlusion_width);
    let y = rng.random_range(0..=height - occlusion_height);
    draw_filled_rect_mut(
        &mut occluded,
        Rect::at(x as i32, y as i32).of_size(occlusion_width, occlusion_height),
        OCCLUDER_COLOR,
    );
    Ok(occluded)
}
