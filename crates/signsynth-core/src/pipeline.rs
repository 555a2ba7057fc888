//! Compositing pipeline: one background, a few warped overlays, one
//! whole-canvas effect, one saved image with its annotations.
//!
//! # Stages per image
//!
//! 1. **Select background**: uniform draw with replacement, optional resize
//! 2. **Place overlays**: `min_overlays..=max_overlays` times
//!    - pick an asset and resolve its category
//!    - random subset of [`OverlayTechnique`]s, tight crop after each
//!    - zero or one [`Distortion`], tight crop after it
//!    - resize to a square, find a free spot, alpha-composite
//! 3. **Background effect**: exactly one [`BackgroundEffect`]
//! 4. **Persist**: save `<idx>.png`, commit the image and its annotations
//!
//! # Failure containment
//!
//! A failing technique is logged and skipped. An overlay that ends up empty,
//! fails to decode, has an unknown category, or finds no free spot is
//! dropped without touching the canvas. A failing background effect leaves
//! the canvas as it was. Only asset discovery, saving and writing the
//! dataset abort the run.

use std::path::{Path, PathBuf};

use image::buffer::ConvertBuffer;
use image::{imageops, ImageFormat, RgbImage, RgbaImage};
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::assets::{AssetError, AssetLibrary, OverlayAsset};
use crate::config::{ConfigError, GeneratorConfig};
use crate::dataset::{AnnotationStore, CategoryRegistry, Dataset, DatasetError, Placement};
use crate::placement::{BoundingBox, PlacementAllocator};
use crate::technique::{BackgroundEffect, Distortion, OverlayTechnique, TechniqueContext};
use crate::transform::{resize, resize_square, tight_crop, FilterType};

/// Background draws before a run gives up on decoding one.
const MAX_BACKGROUND_DRAWS: usize = 10;

/// Each placement retry shrinks the overlay side to this fraction.
const RETRY_SHRINK: f64 = 0.75;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Assets(#[from] AssetError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("failed to save {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("no background could be decoded after {attempts} draws: {last}")]
    NoUsableBackground { attempts: usize, last: AssetError },
}

/// Summary of one persisted canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub image_id: u64,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub placements: Vec<Placement>,
}

/// An overlay that made it onto the canvas.
struct PlacedOverlay {
    placement: Placement,
    pixels: RgbaImage,
}

/// Drives a full generation run and owns its [`AnnotationStore`].
pub struct CompositionPipeline {
    config: GeneratorConfig,
    assets: AssetLibrary,
    allocator: PlacementAllocator,
    store: AnnotationStore,
}

impl CompositionPipeline {
    /// # Errors
    ///
    /// [`PipelineError::Config`] if the configuration does not validate.
    pub fn new(config: GeneratorConfig, assets: AssetLibrary) -> Result<Self, PipelineError> {
        Self::with_registry(config, assets, CategoryRegistry::traffic_signs())
    }

    pub fn with_registry(
        config: GeneratorConfig,
        assets: AssetLibrary,
        registry: CategoryRegistry,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            config,
            assets,
            allocator: PlacementAllocator::default(),
            store: AnnotationStore::new(registry),
        })
    }

    /// Discover assets from the configured directories, then build.
    pub fn from_config(config: GeneratorConfig) -> Result<Self, PipelineError> {
        let assets = AssetLibrary::load(&config.overlays_path, &config.backgrounds_path)?;
        Self::new(config, assets)
    }

    pub fn dataset(&self) -> &Dataset {
        self.store.dataset()
    }

    /// Generate `number_of_images` canvases and return the finished dataset.
    ///
    /// The images directory must already exist.
    pub fn run<R: Rng + ?Sized>(mut self, rng: &mut R) -> Result<Dataset, PipelineError> {
        for _ in 0..self.config.number_of_images {
            self.generate_image(rng)?;
        }
        let dataset = self.store.into_dataset();
        info!(
            images = dataset.images.len(),
            annotations = dataset.annotations.len(),
            "generation complete"
        );
        Ok(dataset)
    }

    /// Build, save and record the next canvas.
    ///
    /// The file is named after the image id the store assigns next, so
    /// `<id>.png` and the image record always agree.
    pub fn generate_image<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<GeneratedImage, PipelineError> {
        let idx = self.store.next_image_id();
        let mut canvas = self.select_background(rng)?;
        let (width, height) = canvas.dimensions();

        let placed = self.place_overlays(&mut canvas, rng);

        if let Some(&effect) = self.config.background_effects.choose(rng) {
            canvas = apply_background_effect(effect, canvas, rng);
        }

        let file_name = format!("{idx}.png");
        let path = self.config.images_save_path.join(&file_name);
        save_rgb_png(&canvas, &path)?;

        if self.config.save_overlay_crops {
            for (i, overlay) in placed.iter().enumerate() {
                let crop_path = self.config.images_save_path.join(format!("{idx}_{i}.png"));
                overlay
                    .pixels
                    .save_with_format(&crop_path, ImageFormat::Png)
                    .map_err(|source| PipelineError::Save {
                        path: crop_path.clone(),
                        source,
                    })?;
            }
        }

        let placements: Vec<Placement> = placed.into_iter().map(|p| p.placement).collect();
        let image_id = self
            .store
            .commit_image(file_name, width, height, &placements)?;
        info!(
            image_id,
            objects = placements.len(),
            path = %path.display(),
            "saved image"
        );

        Ok(GeneratedImage {
            image_id,
            path,
            width,
            height,
            placements,
        })
    }

    fn select_background<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<RgbaImage, PipelineError> {
        let mut last = None;
        for _ in 0..MAX_BACKGROUND_DRAWS {
            let Some(asset) = self.assets.backgrounds.choose(rng) else {
                break;
            };
            match asset.load() {
                Ok(background) => {
                    debug!(path = %asset.path.display(), "selected background");
                    return self.fit_background(background);
                }
                Err(e) => {
                    warn!(error = %e, "background skipped");
                    last = Some(e);
                }
            }
        }

        let last = last.unwrap_or_else(|| AssetError::MissingAssets {
            kind: "background",
            dir: self.config.backgrounds_path.clone(),
        });
        Err(PipelineError::NoUsableBackground {
            attempts: MAX_BACKGROUND_DRAWS,
            last,
        })
    }

    fn fit_background(&self, background: RgbaImage) -> Result<RgbaImage, PipelineError> {
        if !self.config.resize {
            return Ok(background);
        }
        // Validated non-zero, so resizing cannot fail
        resize(
            &background,
            self.config.width,
            self.config.height,
            FilterType::Bicubic,
        )
        .map_err(|e| PipelineError::Config(ConfigError::Invalid(e.to_string())))
    }

    fn place_overlays<R: Rng + ?Sized>(
        &self,
        canvas: &mut RgbaImage,
        rng: &mut R,
    ) -> Vec<PlacedOverlay> {
        let count = rng.random_range(self.config.min_overlays..=self.config.max_overlays);
        let mut placed: Vec<PlacedOverlay> = Vec::new();

        for i in 0..count {
            let Some(asset) = self.assets.overlays.choose(rng) else {
                break;
            };
            let boxes: Vec<BoundingBox> = placed.iter().map(|p| p.placement.bbox).collect();

            if let Some(overlay) = self.place_overlay(asset, canvas, &boxes, rng) {
                debug!(
                    overlay = i,
                    label = %asset.label,
                    bbox = ?overlay.placement.bbox,
                    "placed overlay"
                );
                placed.push(overlay);
            }
        }
        placed
    }

    /// Run one overlay through the chain and composite it. `None` means the
    /// overlay was dropped and the canvas is untouched.
    fn place_overlay<R: Rng + ?Sized>(
        &self,
        asset: &OverlayAsset,
        canvas: &mut RgbaImage,
        existing: &[BoundingBox],
        rng: &mut R,
    ) -> Option<PlacedOverlay> {
        let category_id = match self.store.registry().resolve(&asset.label) {
            Ok(id) => id,
            Err(e) => {
                warn!(path = %asset.path.display(), error = %e, "overlay skipped");
                return None;
            }
        };

        let pixels = match asset.load() {
            Ok(img) => img,
            Err(e) => {
                warn!(error = %e, "overlay skipped");
                return None;
            }
        };
        let overlay = augment_overlay(&pixels, rng)?;

        let (canvas_w, canvas_h) = canvas.dimensions();
        let mut side = rng.random_range(canvas_w / 12..=canvas_w / 4).max(1);

        for round in 0..=self.config.placement_retries {
            match self
                .allocator
                .try_place(existing, canvas_w, canvas_h, side, side, rng)
            {
                Ok(bbox) => {
                    let resized = match resize_square(&overlay, side, FilterType::Bicubic) {
                        Ok(img) => img,
                        Err(e) => {
                            warn!(error = %e, "overlay skipped");
                            return None;
                        }
                    };
                    imageops::overlay(canvas, &resized, bbox.x as i64, bbox.y as i64);
                    return Some(PlacedOverlay {
                        placement: Placement { bbox, category_id },
                        pixels: resized,
                    });
                }
                Err(e) => {
                    debug!(round, side, error = %e, "placement failed");
                    side = ((side as f64 * RETRY_SHRINK) as u32).max(1);
                }
            }
        }

        warn!(
            path = %asset.path.display(),
            retries = self.config.placement_retries,
            "overlay skipped: no free position"
        );
        None
    }
}

/// Apply the random technique chain to a freshly loaded overlay.
///
/// Returns `None` when the overlay has no opaque pixels left.
pub fn augment_overlay<R: Rng + ?Sized>(asset: &RgbaImage, rng: &mut R) -> Option<RgbaImage> {
    let ctx = TechniqueContext::for_asset(asset);
    let mut overlay = crop_or_drop(asset)?;

    let mut techniques = OverlayTechnique::ALL.to_vec();
    techniques.shuffle(rng);
    techniques.truncate(rng.random_range(0..=OverlayTechnique::ALL.len()));
    overlay = apply_overlay_techniques(overlay, &techniques, &ctx, rng)?;

    if rng.random_bool(0.5) {
        if let Some(&distortion) = Distortion::ALL.choose(rng) {
            match distortion.apply(&overlay, &ctx, rng) {
                Ok(out) => {
                    debug!(distortion = distortion.name(), "applied distortion");
                    overlay = crop_or_drop(&out)?;
                }
                Err(e) => warn!(distortion = distortion.name(), error = %e, "distortion skipped"),
            }
        }
    }

    Some(overlay)
}

/// Run `techniques` in order, tight-cropping after each.
///
/// A failing technique is skipped and the next one sees the previous
/// result. Returns `None` when a step leaves no opaque pixels.
pub fn apply_overlay_techniques<R: Rng + ?Sized>(
    mut overlay: RgbaImage,
    techniques: &[OverlayTechnique],
    ctx: &TechniqueContext,
    rng: &mut R,
) -> Option<RgbaImage> {
    for &technique in techniques {
        match technique.apply(&overlay, ctx, rng) {
            Ok(out) => {
                debug!(technique = technique.name(), "applied overlay technique");
                overlay = crop_or_drop(&out)?;
            }
            Err(e) => warn!(technique = technique.name(), error = %e, "technique skipped"),
        }
    }
    Some(overlay)
}

/// Apply one whole-canvas effect; on failure the canvas comes back as is.
pub fn apply_background_effect<R: Rng + ?Sized>(
    effect: BackgroundEffect,
    canvas: RgbaImage,
    rng: &mut R,
) -> RgbaImage {
    match effect.apply(&canvas, rng) {
        Ok(out) => {
            debug!(effect = effect.name(), "applied background effect");
            out
        }
        Err(e) => {
            warn!(effect = effect.name(), error = %e, "background effect skipped");
            canvas
        }
    }
}

fn crop_or_drop(image: &RgbaImage) -> Option<RgbaImage> {
    match tight_crop(image) {
        Ok(cropped) => Some(cropped),
        Err(e) => {
            warn!(error = %e, "overlay dropped");
            None
        }
    }
}

/// Drop alpha and write an 8-bit RGB PNG.
fn save_rgb_png(canvas: &RgbaImage, path: &Path) -> Result<(), PipelineError> {
    let rgb: RgbImage = canvas.convert();
    rgb.save_with_format(path, ImageFormat::Png)
        .map_err(|source| PipelineError::Save {
            path: path.to_path_buf(),
            source,
        })
}
