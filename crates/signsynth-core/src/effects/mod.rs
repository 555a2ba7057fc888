//! Photometric effects: pixel-value perturbations for overlays and canvases.
//!
//! All effects are pure: they take an image by reference and return a new
//! image of identical dimensions. Only RGB channels change; alpha is carried
//! through so the same functions work on overlays and backgrounds.

use thiserror::Error;

mod enhance;
mod hls;
mod noise;
mod weather;

pub use enhance::{blend_color, brightness, contrast};
pub use hls::{hls_to_rgb, lightness, map_lightness, rgb_to_hls, Hls};
pub use noise::gaussian_noise;
pub use weather::{
    fog, fog_with_density, rain, snow, sunny, FOG_COLOR, FOG_RADIUS, RAIN_COLOR, RAIN_DARKEN,
    RAIN_DROPS, RAIN_SLANT, SNOW_BRIGHTEN, SNOW_THRESHOLD, SUN_TINT,
};

/// Errors raised by photometric effects.
#[derive(Debug, Error)]
pub enum EffectError {
    /// A numeric parameter outside its valid domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The image cannot accommodate the effect's geometry.
    #[error("image {width}x{height} is too small for {effect}")]
    ImageTooSmall {
        effect: &'static str,
        width: u32,
        height: u32,
    },
}
