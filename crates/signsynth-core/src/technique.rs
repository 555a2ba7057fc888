//! Randomised augmentation techniques as enums.
//!
//! Each variant owns its parameter draw, so the pipeline only picks a
//! variant and calls `apply`. Failures come back as [`TechniqueError`] and
//! the caller decides whether to skip the step.

use image::RgbaImage;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::effects::{self, EffectError, FOG_RADIUS};
use crate::transform::{self, ElasticParams, TransformError};

/// Range for brightness and contrast factors.
const ENHANCE_RANGE: (f32, f32) = (0.4, 1.6);
/// Overlay rotation range in degrees.
const ROTATION_RANGE: (f64, f64) = (-30.0, 30.0);
const SHEAR_RANGE: (f64, f64) = (-0.5, 0.5);
const PINCUSHION_RANGE: (f64, f64) = (0.001, 0.0016);
const BARREL_RANGE: (f64, f64) = (0.001, 0.3);
/// Shortest rain streak.
const MIN_DROP_LENGTH: u32 = 5;

#[derive(Debug, Error)]
pub enum TechniqueError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Effect(#[from] EffectError),
}

/// Facts about the overlay as loaded, before any technique ran.
///
/// Occlusion size and shear/pincushion padding scale with the asset, not
/// with the intermediate result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TechniqueContext {
    pub asset_width: u32,
    pub asset_height: u32,
}

impl TechniqueContext {
    pub fn for_asset(asset: &RgbaImage) -> Self {
        Self {
            asset_width: asset.width(),
            asset_height: asset.height(),
        }
    }
}

/// Per-overlay techniques, applied as a random subset in random order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayTechnique {
    Brightness,
    Contrast,
    Rotate,
    Occlude,
    Shear,
}

impl OverlayTechnique {
    pub const ALL: [OverlayTechnique; 5] = [
        OverlayTechnique::Brightness,
        OverlayTechnique::Contrast,
        OverlayTechnique::Rotate,
        OverlayTechnique::Occlude,
        OverlayTechnique::Shear,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OverlayTechnique::Brightness => "brightness",
            OverlayTechnique::Contrast => "contrast",
            OverlayTechnique::Rotate => "rotate",
            OverlayTechnique::Occlude => "occlude",
            OverlayTechnique::Shear => "shear",
        }
    }

    pub fn apply<R: Rng + ?Sized>(
        self,
        image: &RgbaImage,
        ctx: &TechniqueContext,
        rng: &mut R,
    ) -> Result<RgbaImage, TechniqueError> {
        let out = match self {
            OverlayTechnique::Brightness => {
                effects::brightness(image, rng.random_range(ENHANCE_RANGE.0..=ENHANCE_RANGE.1))
            }
            OverlayTechnique::Contrast => {
                effects::contrast(image, rng.random_range(ENHANCE_RANGE.0..=ENHANCE_RANGE.1))
            }
            OverlayTechnique::Rotate => {
                transform::random_rotate(image, ROTATION_RANGE.0, ROTATION_RANGE.1, rng)?
            }
            OverlayTechnique::Occlude => {
                let (w, h) = (ctx.asset_width, ctx.asset_height);
                let occlusion_width = rng.random_range(w / 8..=w / 3);
                let occlusion_height = rng.random_range(h / 8..=h / 3);
                transform::occlude(image, occlusion_width, occlusion_height, rng)?
            }
            OverlayTechnique::Shear => {
                let factor = rng.random_range(SHEAR_RANGE.0..=SHEAR_RANGE.1);
                transform::shear(image, factor, ctx.asset_width)
            }
        };
        Ok(out)
    }
}

/// Radial or elastic warps; at most one per overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Distortion {
    Pincushion,
    Barrel,
    Elastic,
}

impl Distortion {
    pub const ALL: [Distortion; 3] = [Distortion::Pincushion, Distortion::Barrel, Distortion::Elastic];

    pub fn name(self) -> &'static str {
        match self {
            Distortion::Pincushion => "pincushion",
            Distortion::Barrel => "barrel",
            Distortion::Elastic => "elastic",
        }
    }

    pub fn apply<R: Rng + ?Sized>(
        self,
        image: &RgbaImage,
        ctx: &TechniqueContext,
        rng: &mut R,
    ) -> Result<RgbaImage, TechniqueError> {
        let out = match self {
            Distortion::Pincushion => {
                let strength = rng.random_range(PINCUSHION_RANGE.0..=PINCUSHION_RANGE.1);
                transform::pincushion(image, ctx.asset_width, strength)
            }
            Distortion::Barrel => {
                transform::barrel(image, rng.random_range(BARREL_RANGE.0..=BARREL_RANGE.1))
            }
            Distortion::Elastic => transform::elastic(image, ElasticParams::default(), rng)?,
        };
        Ok(out)
    }
}

/// Whole-canvas effects; exactly one per generated image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundEffect {
    Brightness,
    Contrast,
    GaussianNoise,
    Rain,
    Sun,
    Snow,
    Fog,
}

impl BackgroundEffect {
    pub const ALL: [BackgroundEffect; 7] = [
        BackgroundEffect::Brightness,
        BackgroundEffect::Contrast,
        BackgroundEffect::GaussianNoise,
        BackgroundEffect::Rain,
        BackgroundEffect::Sun,
        BackgroundEffect::Snow,
        BackgroundEffect::Fog,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BackgroundEffect::Brightness => "brightness",
            BackgroundEffect::Contrast => "contrast",
            BackgroundEffect::GaussianNoise => "gaussian_noise",
            BackgroundEffect::Rain => "rain",
            BackgroundEffect::Sun => "sun",
            BackgroundEffect::Snow => "snow",
            BackgroundEffect::Fog => "fog",
        }
    }

    /// Background effects draw their parameters from the canvas itself, so
    /// no [`TechniqueContext`] is needed.
    pub fn apply<R: Rng + ?Sized>(
        self,
        image: &RgbaImage,
        rng: &mut R,
    ) -> Result<RgbaImage, TechniqueError> {
        let out = match self {
            BackgroundEffect::Brightness => {
                effects::brightness(image, rng.random_range(ENHANCE_RANGE.0..=ENHANCE_RANGE.1))
            }
            BackgroundEffect::Contrast => {
                effects::contrast(image, rng.random_range(ENHANCE_RANGE.0..=ENHANCE_RANGE.1))
            }
            BackgroundEffect::GaussianNoise => {
                let mean = rng.random_range(0.0f32..=1.0);
                let std = rng.random_range(0.0f32..=1.0);
                effects::gaussian_noise(image, mean, std, rng)?
            }
            BackgroundEffect::Rain => {
                let max_len = image.height() / 14;
                if max_len < MIN_DROP_LENGTH {
                    return Err(EffectError::ImageTooSmall {
                        effect: "rain",
                        width: image.width(),
                        height: image.height(),
                    }
                    .into());
                }
                let drop_length = rng.random_range(MIN_DROP_LENGTH..=max_len);
                effects::rain(image, drop_length, rng)?
            }
            BackgroundEffect::Sun => effects::sunny(image, rng),
            BackgroundEffect::Snow => effects::snow(image),
            BackgroundEffect::Fog => effects::fog(image, FOG_RADIUS, rng),
        };
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sign(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 4 % 256) as u8, (y * 4 % 256) as u8, 90, 255])
        })
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = BackgroundEffect::ALL.iter().map(|e| e.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BackgroundEffect::ALL.len());
        assert_eq!(OverlayTechnique::Occlude.name(), "occlude");
        assert_eq!(Distortion::Elastic.name(), "elastic");
    }

    #[test]
    fn test_every_overlay_technique_applies() {
        let img = sign(48, 48);
        let ctx = TechniqueContext::for_asset(&img);
        let mut rng = StdRng::seed_from_u64(10);
        for technique in OverlayTechnique::ALL {
            let out = technique.apply(&img, &ctx, &mut rng).unwrap();
            assert!(out.width() > 0 && out.height() > 0, "{}", technique.name());
        }
    }

    #[test]
    fn test_shear_and_pincushion_pad_by_asset_width() {
        let img = sign(20, 10);
        let ctx = TechniqueContext::for_asset(&img);
        let mut rng = StdRng::seed_from_u64(1);

        let sheared = OverlayTechnique::Shear.apply(&img, &ctx, &mut rng).unwrap();
        assert_eq!(sheared.dimensions(), (60, 50));

        let pinched = Distortion::Pincushion.apply(&img, &ctx, &mut rng).unwrap();
        assert_eq!(pinched.dimensions(), (60, 50));
    }

    #[test]
    fn test_occlusion_larger_than_current_overlay_fails() {
        // Context from a big asset, applied to a small intermediate result
        let ctx = TechniqueContext {
            asset_width: 300,
            asset_height: 300,
        };
        let mut rng = StdRng::seed_from_u64(2);
        let err = OverlayTechnique::Occlude
            .apply(&sign(10, 10), &ctx, &mut rng)
            .unwrap_err();
        assert!(matches!(
            err,
            TechniqueError::Transform(TransformError::OcclusionTooLarge { .. })
        ));
    }

    #[test]
    fn test_distortions_keep_or_grow_canvas() {
        let img = sign(32, 24);
        let ctx = TechniqueContext::for_asset(&img);
        let mut rng = StdRng::seed_from_u64(3);
        for distortion in Distortion::ALL {
            let out = distortion.apply(&img, &ctx, &mut rng).unwrap();
            assert!(out.width() >= 32 && out.height() >= 24, "{}", distortion.name());
        }
    }

    #[test]
    fn test_background_effects_keep_dimensions() {
        let canvas = RgbaImage::from_pixel(140, 100, Rgba([120, 130, 140, 255]));
        let mut rng = StdRng::seed_from_u64(4);
        for effect in BackgroundEffect::ALL {
            let out = effect.apply(&canvas, &mut rng).unwrap();
            assert_eq!(out.dimensions(), canvas.dimensions(), "{}", effect.name());
        }
    }

    #[test]
    fn test_rain_on_short_canvas_fails() {
        let canvas = RgbaImage::from_pixel(200, 60, Rgba([0, 0, 0, 255]));
        let mut rng = StdRng::seed_from_u64(5);
        let err = BackgroundEffect::Rain.apply(&canvas, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            TechniqueError::Effect(EffectError::ImageTooSmall { effect: "rain", .. })
        ));
    }
}
