//! COCO-style dataset document and its single-writer accumulator.
//!
//! # Document shape
//!
//! ```text
//! { "images": [...], "categories": [...], "annotations": [...] }
//! ```
//!
//! Bounding boxes use `[x, y, width, height]` with `(x, y)` the top-left
//! corner in canvas pixels.
//!
//! # Identifiers
//!
//! Image ids are the 0-based order in which canvases are committed.
//! Annotation ids start at 1 and increase by one across the whole run.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::placement::BoundingBox;

/// Supercategory shared by every built-in category.
pub const TRAFFIC_SIGN_SUPERCATEGORY: &str = "trafficsign";

/// Built-in traffic-sign categories as `(id, name)`.
pub const TRAFFIC_SIGN_CATEGORIES: [(u32, &str); 6] = [
    (1, "stop"),
    (2, "left"),
    (3, "right"),
    (4, "straight"),
    (5, "no_left"),
    (6, "no_right"),
];

/// Errors raised while building or writing a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// A label with no matching category.
    #[error("unknown category label '{0}'")]
    UnknownCategory(String),

    /// An annotation referencing a category id that is not registered.
    #[error("unknown category id {0}")]
    UnknownCategoryId(u32),

    #[error("failed to write dataset to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize dataset to {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One object class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: u32,
    pub name: String,
    pub supercategory: String,
}

/// One generated canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: u64,
    pub file_name: String,
    pub height: u32,
    pub width: u32,
}

/// One placed object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub id: u64,
    pub image_id: u64,
    pub category_id: u32,
    /// `[x, y, width, height]`
    pub bbox: [u32; 4],
    pub area: u64,
    pub iscrowd: u8,
    pub segmentation: Vec<Vec<f64>>,
}

impl AnnotationRecord {
    pub fn bounding_box(&self) -> BoundingBox {
        let [x, y, w, h] = self.bbox;
        BoundingBox::new(x, y, w, h)
    }
}

/// The full dataset document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub images: Vec<ImageRecord>,
    pub categories: Vec<CategoryRecord>,
    pub annotations: Vec<AnnotationRecord>,
}

impl Dataset {
    /// Annotations belonging to one image.
    pub fn annotations_for(&self, image_id: u64) -> impl Iterator<Item = &AnnotationRecord> {
        self.annotations
            .iter()
            .filter(move |a| a.image_id == image_id)
    }
}

/// Fixed label -> category mapping known at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRegistry {
    categories: Vec<CategoryRecord>,
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::traffic_signs()
    }
}

impl CategoryRegistry {
    pub fn new(categories: Vec<CategoryRecord>) -> Self {
        Self { categories }
    }

    /// The built-in traffic-sign set.
    pub fn traffic_signs() -> Self {
        Self::new(
            TRAFFIC_SIGN_CATEGORIES
                .iter()
                .map(|&(id, name)| CategoryRecord {
                    id,
                    name: name.to_string(),
                    supercategory: TRAFFIC_SIGN_SUPERCATEGORY.to_string(),
                })
                .collect(),
        )
    }

    /// Category id for a label.
    ///
    /// # Errors
    ///
    /// [`DatasetError::UnknownCategory`] when no category has that name.
    pub fn resolve(&self, label: &str) -> Result<u32, DatasetError> {
        self.categories
            .iter()
            .find(|c| c.name == label)
            .map(|c| c.id)
            .ok_or_else(|| DatasetError::UnknownCategory(label.to_string()))
    }

    pub fn contains_id(&self, id: u32) -> bool {
        self.categories.iter().any(|c| c.id == id)
    }

    pub fn records(&self) -> &[CategoryRecord] {
        &self.categories
    }
}

/// A placed object awaiting its image record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub bbox: BoundingBox,
    pub category_id: u32,
}

/// Append-only accumulator that owns the run's [`Dataset`].
///
/// Canvases are committed together with their placements, so an image
/// record and its annotations either all land or none do.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    registry: CategoryRegistry,
    dataset: Dataset,
}

impl AnnotationStore {
    pub fn new(registry: CategoryRegistry) -> Self {
        let dataset = Dataset {
            categories: registry.records().to_vec(),
            ..Dataset::default()
        };
        Self { registry, dataset }
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    /// Id the next committed image will receive.
    pub fn next_image_id(&self) -> u64 {
        self.dataset.images.len() as u64
    }

    /// Id the next annotation will receive.
    pub fn next_annotation_id(&self) -> u64 {
        self.dataset.annotations.len() as u64 + 1
    }

    /// Record a saved canvas and every object placed on it.
    ///
    /// # Returns
    ///
    /// The image id assigned to the canvas.
    ///
    /// # Errors
    ///
    /// [`DatasetError::UnknownCategoryId`] if any placement references an
    /// unregistered category; the store is left unchanged.
    pub fn commit_image(
        &mut self,
        file_name: impl Into<String>,
        width: u32,
        height: u32,
        placements: &[Placement],
    ) -> Result<u64, DatasetError> {
        if let Some(bad) = placements
            .iter()
            .find(|p| !self.registry.contains_id(p.category_id))
        {
            return Err(DatasetError::UnknownCategoryId(bad.category_id));
        }

        let image_id = self.next_image_id();
        self.dataset.images.push(ImageRecord {
            id: image_id,
            file_name: file_name.into(),
            height,
            width,
        });

        for placement in placements {
            let id = self.next_annotation_id();
            self.dataset.annotations.push(AnnotationRecord {
                id,
                image_id,
                category_id: placement.category_id,
                bbox: placement.bbox.to_xywh(),
                area: placement.bbox.area(),
                iscrowd: 0,
                segmentation: Vec::new(),
            });
        }

        Ok(image_id)
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }
}

/// Write the dataset as compact JSON to `path`.
///
/// # Errors
///
/// [`DatasetError::Io`] or [`DatasetError::Serialize`] with the path.
pub fn write_dataset_json(dataset: &Dataset, path: &Path) -> Result<(), DatasetError> {
    let io_err = |source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer(&mut writer, dataset).map_err(|source| DatasetError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(io_err)
}
