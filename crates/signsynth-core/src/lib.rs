//! SignSynth Core - synthetic object-detection dataset generation
//!
//! This crate composites small sign overlays onto background photos,
//! perturbs them geometrically and photometrically, and records exact
//! bounding-box annotations in a COCO-style document.
//!
//! # Modules
//!
//! - [`transform`]: rotation, shear, occlusion, radial and elastic warps, tight crop
//! - [`effects`]: brightness, contrast, noise and weather effects
//! - [`placement`]: bounded random search for non-overlapping boxes
//! - [`dataset`]: category registry, annotation store, JSON writer
//! - [`assets`]: overlay/background discovery and lazy decoding
//! - [`technique`]: randomised technique enums used by the pipeline
//! - [`pipeline`]: the per-image compositing state machine
//!
//! All randomness flows through an explicit `rand::Rng` argument, so a
//! seeded generator reproduces a run exactly.

pub mod assets;
pub mod config;
pub mod dataset;
pub mod effects;
pub mod luminance;
pub mod pipeline;
pub mod placement;
pub mod technique;
pub mod transform;

pub use assets::{AssetError, AssetLibrary, BackgroundAsset, OverlayAsset};
pub use config::{ConfigError, GeneratorConfig};
pub use dataset::{
    write_dataset_json, AnnotationRecord, AnnotationStore, CategoryRecord, CategoryRegistry,
    Dataset, DatasetError, ImageRecord, Placement,
};
pub use effects::EffectError;
pub use pipeline::{CompositionPipeline, GeneratedImage, PipelineError};
pub use placement::{BoundingBox, PlacementAllocator, PlacementError};
pub use technique::{BackgroundEffect, Distortion, OverlayTechnique, TechniqueContext, TechniqueError};
pub use transform::TransformError;
