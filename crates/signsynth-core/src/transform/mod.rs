//! Geometric transforms for alpha-masked overlays.
//!
//! Every function takes an overlay by reference and returns a new image;
//! nothing is modified in place.
//!
//! # Bounding-box tracking
//!
//! Rotation, shear and the radial distortions move content around a padded
//! or expanded canvas. The pipeline re-runs [`tight_crop`] after each of them
//! so the overlay's dimensions always equal the extent of its visible pixels,
//! which is what ends up in the annotation.
//!
//! # Coordinate System
//!
//! - Rotation angles are in degrees, positive = counter-clockwise
//! - Radial offsets are measured from the canvas centre
//! - Origin is top-left corner

use thiserror::Error;

mod crop;
mod distort;
mod elastic;
mod occlusion;
mod resize;
mod rotation;
mod shear;

pub use crop::{crop_region, opaque_bounds, pad, tight_crop};
pub use distort::{barrel, pincushion};
pub use elastic::{elastic, ElasticParams};
pub use occlusion::{occlude, OCCLUDER_COLOR};
pub use resize::{resize, resize_square, FilterType};
pub use rotation::{apply_rotation, compute_rotated_bounds, random_rotate, InterpolationFilter};
pub use shear::shear;

/// Errors raised by geometric transforms.
#[derive(Debug, Error)]
pub enum TransformError {
    /// No pixel has non-zero alpha, so there is nothing to crop to.
    #[error("overlay has no opaque pixels")]
    EmptyOverlay,

    /// A sampling range with `min > max` (or NaN bounds).
    #[error("invalid range: min ({min}) must not exceed max ({max})")]
    InvalidRange { min: f64, max: f64 },

    /// Width or height is zero.
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The occluder does not fit inside the overlay.
    #[error(
        "occlusion {occlusion_width}x{occlusion_height} does not fit in {width}x{height} overlay"
    )]
    OcclusionTooLarge {
        occlusion_width: u32,
        occlusion_height: u32,
        width: u32,
        height: u32,
    },

    /// A numeric parameter outside its valid domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_error_display() {
        let err = TransformError::OcclusionTooLarge {
            occlusion_width: 5,
            occlusion_height: 6,
            width: 4,
            height: 4,
        };
        assert_eq!(err.to_string(), "occlusion 5x6 does not fit in 4x4 overlay");

        let err = TransformError::EmptyOverlay;
        assert_eq!(err.to_string(), "overlay has no opaque pixels");
    }
}
