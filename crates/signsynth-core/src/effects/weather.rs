//! Weather and lighting simulations built on the enhance primitives.
//!
//! These are approximate visual perturbations. Rain and snow work in HLS so
//! only lightness moves; sun and fog are solid-colour blends.

use image::{Rgb, Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;
use rand::Rng;

use super::enhance::{blend_color, brightness, contrast};
use super::hls::{lightness, map_lightness};
use super::EffectError;

/// Number of rain streaks drawn per image.
pub const RAIN_DROPS: u32 = 1500;
/// Horizontal run of each streak in pixels.
pub const RAIN_SLANT: u32 = 5;
/// Streak colour.
pub const RAIN_COLOR: Rgba<u8> = Rgba([200, 200, 200, 255]);
/// Lightness multiplier applied after the streaks are drawn.
pub const RAIN_DARKEN: f32 = 0.7;

/// Pixels with lightness below this are brightened by snow.
pub const SNOW_THRESHOLD: f32 = 90.0;
/// Lightness multiplier for dark pixels under snow.
pub const SNOW_BRIGHTEN: f32 = 2.0;

/// Solid fog colour.
pub const FOG_COLOR: Rgb<u8> = Rgb([190, 187, 186]);
/// Default radius of the visible fog disc.
pub const FOG_RADIUS: u32 = 1000;

/// Warm tint blended over a sunny scene.
pub const SUN_TINT: Rgb<u8> = Rgb([255, 255, 150]);
const SUN_ENHANCE: f32 = 1.2;

/// Bright, warm lighting: brightness and contrast at 1.2, then a blend
/// toward [`SUN_TINT`] at a ratio drawn from `[0.1, 0.3]`.
pub fn sunny<R: Rng + ?Sized>(image: &RgbaImage, rng: &mut R) -> RgbaImage {
    let ratio = rng.random_range(0.1f32..=0.3);
    let lit = contrast(&brightness(image, SUN_ENHANCE), SUN_ENHANCE);
    blend_color(&lit, SUN_TINT, ratio)
}

/// Draw [`RAIN_DROPS`] slanted grey streaks of `drop_length` pixels, then
/// darken the whole image in HLS space.
///
/// # Errors
///
/// [`EffectError::ImageTooSmall`] unless `width > RAIN_SLANT` and
/// `height > drop_length`.
pub fn rain<R: Rng + ?Sized>(
    image: &RgbaImage,
    drop_length: u32,
    rng: &mut R,
) -> Result<RgbaImage, EffectError> {
    let (width, height) = image.dimensions();
    if width <= RAIN_SLANT || height <= drop_length {
        return Err(EffectError::ImageTooSmall {
            effect: "rain",
            width,
            height,
        });
    }

    let mut output = image.clone();
    for _ in 0..RAIN_DROPS {
        let x = rng.random_range(0..width - RAIN_SLANT);
        let y = rng.random_range(0..height - drop_length);
        draw_line_segment_mut(
            &mut output,
            (x as f32, y as f32),
            ((x + RAIN_SLANT) as f32, (y + drop_length) as f32),
            RAIN_COLOR,
        );
    }

    for pixel in output.pixels_mut() {
        let rgb = map_lightness([pixel[0], pixel[1], pixel[2]], |l| l * RAIN_DARKEN);
        pixel.0[..3].copy_from_slice(&rgb);
    }
    Ok(output)
}

/// Double the lightness of every pixel darker than [`SNOW_THRESHOLD`].
///
/// Pixels at or above the threshold are left bit-exact.
pub fn snow(image: &RgbaImage) -> RgbaImage {
    let mut output = image.clone();
    for pixel in output.pixels_mut() {
        let rgb = [pixel[0], pixel[1], pixel[2]];
        if lightness(rgb) < SNOW_THRESHOLD {
            let brightened = map_lightness(rgb, |l| l * SNOW_BRIGHTEN);
            pixel.0[..3].copy_from_slice(&brightened);
        }
    }
    output
}

/// Fog with a density drawn from `[0.3, 0.7]`. See [`fog_with_density`].
pub fn fog<R: Rng + ?Sized>(image: &RgbaImage, radius: u32, rng: &mut R) -> RgbaImage {
    let density = rng.random_range(0.3f32..=0.7);
    fog_with_density(image, radius, density)
}

/// Blend toward [`FOG_COLOR`] at `density`, then keep only the disc of
/// `radius` around the image centre.
///
/// Outside the disc RGB is set to zero; alpha is never changed.
pub fn fog_with_density(image: &RgbaImage, radius: u32, density: f32) -> RgbaImage {
    let mut output = blend_color(image, FOG_COLOR, density);
    let cx = (image.width() / 2) as i64;
    let cy = (image.height() / 2) as i64;
    let r2 = radius as i64 * radius as i64;

    for (x, y, pixel) in output.enumerate_pixels_mut() {
        let dx = x as i64 - cx;
        let dy = y as i64 - cy;
        if dx * dx + dy * dy > r2 {
            pixel.0[..3].fill(0);
        }
    }
    output
}
