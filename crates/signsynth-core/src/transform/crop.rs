//! Alpha-driven cropping and transparent padding.
//!
//! Every geometric technique grows or warps the overlay canvas, so the
//! pipeline re-runs [`tight_crop`] after each step to keep the overlay's
//! extent equal to its visible pixels. [`pad`] is the inverse operation used
//! by techniques that need room to move content outward.
//!
//! # Coordinate System
//!
//! - Pixel coordinates, origin at the top-left corner
//! - A pixel is "opaque" when its alpha is non-zero

use image::{imageops, Rgba, RgbaImage};

use super::TransformError;

/// Minimal rectangle containing every pixel with non-zero alpha, as
/// `(left, top, width, height)`. `None` when the image is fully transparent.
pub fn opaque_bounds(image: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let mut left = w;
    let mut top = h;
    let mut right = 0u32;
    let mut bottom = 0u32;
    let mut found = false;

    for (y, row) in image.as_raw().chunks_exact(w as usize * 4).enumerate() {
        let y = y as u32;
        let first = row.chunks_exact(4).position(|px| px[3] > 0);
        let Some(first) = first else { continue };
        // Row has at least one opaque pixel, so rposition cannot fail
        let last = row.chunks_exact(4).rposition(|px| px[3] > 0).unwrap_or(first);

        found = true;
        left = left.min(first as u32);
        right = right.max(last as u32);
        top = top.min(y);
        bottom = bottom.max(y);
    }

    found.then(|| (left, top, right - left + 1, bottom - top + 1))
}

/// Crop an overlay to the bounding rectangle of its opaque pixels.
///
/// # Errors
///
/// Returns [`TransformError::EmptyOverlay`] when no pixel has non-zero alpha.
pub fn tight_crop(image: &RgbaImage) -> Result<RgbaImage, TransformError> {
    let (left, top, width, height) = opaque_bounds(image).ok_or(TransformError::EmptyOverlay)?;
    Ok(crop_region(image, left, top, width, height))
}

/// Copy the pixel-space rectangle `(left, top, width, height)` out of `image`.
///
/// The rectangle is clamped to the image; the output is at least 1x1.
pub fn crop_region(image: &RgbaImage, left: u32, top: u32, width: u32, height: u32) -> RgbaImage {
    // Fast path: the whole image
    if left == 0 && top == 0 && width >= image.width() && height >= image.height() {
        return image.clone();
    }

    let left = left.min(image.width().saturating_sub(1));
    let top = top.min(image.height().saturating_sub(1));
    let right = left.saturating_add(width).min(image.width());
    let bottom = top.saturating_add(height).min(image.height());

    let out_width = right.saturating_sub(left).max(1);
    let out_height = bottom.saturating_sub(top).max(1);

    let src_stride = image.width() as usize * 4;
    let row_len = out_width as usize * 4;
    let mut output = Vec::with_capacity(row_len * out_height as usize);

    // Copy pixel data row by row
    let raw = image.as_raw();
    for y in top..top + out_height {
        let start = y as usize * src_stride + left as usize * 4;
        output.extend_from_slice(&raw[start..start + row_len]);
    }

    // Buffer length is exactly out_width * out_height * 4
    RgbaImage::from_raw(out_width, out_height, output)
        .unwrap_or_else(|| RgbaImage::new(out_width, out_height))
}

/// Surround the image with `padding` transparent pixels on every side.
///
/// The canvas grows by `2 * padding` in each dimension.
pub fn pad(image: &RgbaImage, padding: u32) -> RgbaImage {
    if padding == 0 {
        return image.clone();
    }
    let mut padded = RgbaImage::from_pixel(
        image.width() + 2 * padding,
        image.height() + 2 * padding,
        Rgba([0, 0, 0, 0]),
    );
    imageops::replace(&mut padded, image, padding as i64, padding as i64);
    padded
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Transparent canvas with an opaque rectangle at `(x, y, w, h)`.
    fn sprite(canvas: (u32, u32), rect: (u32, u32, u32, u32)) -> RgbaImage {
        let (x0, y0, w, h) = rect;
        RgbaImage::from_fn(canvas.0, canvas.1, |x, y| {
            if x >= x0 && x < x0 + w && y >= y0 && y < y0 + h {
                Rgba([(x % 256) as u8, (y % 256) as u8, 10, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        })
    }

    #[test]
    fn test_tight_crop_finds_rectangle() {
        let img = sprite((40, 30), (5, 7, 10, 4));
        let cropped = tight_crop(&img).unwrap();

        assert_eq!(cropped.dimensions(), (10, 4));
        // First pixel comes from (5, 7) in the source
        assert_eq!(cropped.get_pixel(0, 0), img.get_pixel(5, 7));
    }

    #[test]
    fn test_tight_crop_single_pixel() {
        let img = sprite((9, 9), (8, 0, 1, 1));
        let cropped = tight_crop(&img).unwrap();
        assert_eq!(cropped.dimensions(), (1, 1));
    }

    #[test]
    fn test_tight_crop_fully_opaque_is_identity() {
        let img = sprite((12, 8), (0, 0, 12, 8));
        assert_eq!(tight_crop(&img).unwrap(), img);
    }

    #[test]
    fn test_tight_crop_empty_overlay_errors() {
        let img = RgbaImage::new(16, 16);
        let err = tight_crop(&img).unwrap_err();
        assert!(matches!(err, TransformError::EmptyOverlay));
    }

    #[test]
    fn test_faint_alpha_counts_as_opaque() {
        let mut img = RgbaImage::new(10, 10);
        img.put_pixel(3, 4, Rgba([0, 0, 0, 1]));
        assert_eq!(opaque_bounds(&img), Some((3, 4, 1, 1)));
    }

    #[test]
    fn test_crop_region_clamps_to_bounds() {
        let img = sprite((10, 10), (0, 0, 10, 10));
        let result = crop_region(&img, 8, 8, 5, 5);
        assert_eq!(result.dimensions(), (2, 2));
    }

    #[test]
    fn test_pad_grows_canvas() {
        let img = sprite((4, 3), (0, 0, 4, 3));
        let padded = pad(&img, 5);

        assert_eq!(padded.dimensions(), (14, 13));
        assert_eq!(padded.get_pixel(0, 0)[3], 0);
        assert_eq!(padded.get_pixel(5, 5), img.get_pixel(0, 0));
        assert_eq!(opaque_bounds(&padded), Some((5, 5, 4, 3)));
    }

    #[test]
    fn test_pad_then_crop_roundtrip() {
        let img = sprite((6, 6), (0, 0, 6, 6));
        assert_eq!(tight_crop(&pad(&img, 3)).unwrap(), img);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Canvas size plus an opaque rectangle that fits inside it.
    fn sprite_strategy() -> impl Strategy<Value = (u32, u32, u32, u32, u32, u32)> {
        (2u32..=40, 2u32..=40).prop_flat_map(|(w, h)| {
            (Just(w), Just(h), 0..w, 0..h).prop_flat_map(|(w, h, x, y)| {
                (Just(w), Just(h), Just(x), Just(y), 1..=w - x, 1..=h - y)
            })
        })
    }

    fn build((w, h, x0, y0, rw, rh): (u32, u32, u32, u32, u32, u32)) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            if x >= x0 && x < x0 + rw && y >= y0 && y < y0 + rh {
                Rgba([x as u8, y as u8, 0, 200])
            } else {
                Rgba([0, 0, 0, 0])
            }
        })
    }

    proptest! {
        /// Property: cropping twice is the same as cropping once.
        #[test]
        fn prop_tight_crop_idempotent(sprite in sprite_strategy()) {
            let img = build(sprite);
            let once = tight_crop(&img).unwrap();
            let twice = tight_crop(&once).unwrap();
            prop_assert_eq!(once, twice);
        }

        /// Property: the crop is exactly the opaque rectangle.
        #[test]
        fn prop_tight_crop_matches_rectangle(sprite in sprite_strategy()) {
            let img = build(sprite);
            let cropped = tight_crop(&img).unwrap();
            prop_assert_eq!(cropped.dimensions(), (sprite.4, sprite.5));
        }

        /// Property: the cropped result has opaque pixels on every border.
        #[test]
        fn prop_tight_crop_touches_all_edges(sprite in sprite_strategy()) {
            let cropped = tight_crop(&build(sprite)).unwrap();
            let (w, h) = cropped.dimensions();
            prop_assert!((0..h).any(|y| cropped.get_pixel(0, y)[3] > 0));
            prop_assert!((0..h).any(|y| cropped.get_pixel(w - 1, y)[3] > 0));
            prop_assert!((0..w).any(|x| cropped.get_pixel(x, 0)[3] > 0));
            prop_assert!((0..w).any(|x| cropped.get_pixel(x, h - 1)[3] > 0));
        }
    }
}
