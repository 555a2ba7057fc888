//! Run configuration.
//!
//! [`GeneratorConfig`] deserialises from JSON with every field optional;
//! missing fields take the defaults below.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::technique::BackgroundEffect;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Options for one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Resize every background to `width x height` before compositing.
    pub resize: bool,
    pub width: u32,
    pub height: u32,
    pub number_of_images: u32,
    pub overlays_path: PathBuf,
    pub backgrounds_path: PathBuf,
    pub images_save_path: PathBuf,
    pub annotation_save_path: PathBuf,
    /// Dataset file name without the `.json` extension.
    pub annotation_filename: String,
    /// Seed for the run's random stream; entropy when absent.
    pub seed: Option<u64>,
    pub min_overlays: u32,
    pub max_overlays: u32,
    /// Extra placement rounds, each with a 25% smaller overlay.
    pub placement_retries: u32,
    /// Also write each placed overlay to `<idx>_<i>.png`.
    pub save_overlay_crops: bool,
    /// Pool the per-image background effect is drawn from.
    pub background_effects: Vec<BackgroundEffect>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            resize: false,
            width: 240,
            height: 180,
            number_of_images: 100,
            overlays_path: PathBuf::from("signs"),
            backgrounds_path: PathBuf::from("backgrounds"),
            images_save_path: PathBuf::from("output/images"),
            annotation_save_path: PathBuf::from("output/annotations"),
            annotation_filename: "annotation".to_string(),
            seed: None,
            min_overlays: 1,
            max_overlays: 3,
            placement_retries: 3,
            save_overlay_crops: false,
            background_effects: BackgroundEffect::ALL.to_vec(),
        }
    }
}

impl GeneratorConfig {
    /// Read a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject option combinations the generator cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_overlays == 0 {
            return Err(ConfigError::Invalid("min_overlays must be at least 1".into()));
        }
        if self.min_overlays > self.max_overlays {
            return Err(ConfigError::Invalid(format!(
                "min_overlays ({}) exceeds max_overlays ({})",
                self.min_overlays, self.max_overlays
            )));
        }
        if self.resize && (self.width == 0 || self.height == 0) {
            return Err(ConfigError::Invalid(format!(
                "resize target {}x{} must be non-zero",
                self.width, self.height
            )));
        }
        if self.background_effects.is_empty() {
            return Err(ConfigError::Invalid("background_effects is empty".into()));
        }
        if self.annotation_filename.is_empty() {
            return Err(ConfigError::Invalid("annotation_filename is empty".into()));
        }
        Ok(())
    }

    /// `<annotation_save_path>/<annotation_filename>.json`
    pub fn annotation_path(&self) -> PathBuf {
        self.annotation_save_path
            .join(format!("{}.json", self.annotation_filename))
    }
}
