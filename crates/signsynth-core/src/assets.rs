//! On-disk overlay and background assets.
//!
//! An [`AssetLibrary`] is built once per run from two directories. Each
//! overlay is registered with an explicit category label at load time,
//! either from a `manifest.json` in the overlay directory or derived from
//! the file stem. Pixel data is decoded only when an asset is selected.

use std::collections::BTreeMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageReader, RgbaImage};
use thiserror::Error;
use tracing::{debug, warn};

/// File name of the optional overlay manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Extensions recognised as images (compared case-insensitively).
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Errors raised while discovering or decoding assets.
#[derive(Debug, Error)]
pub enum AssetError {
    /// An asset directory holds no usable images.
    #[error("no {kind} images found in {}", dir.display())]
    MissingAssets { kind: &'static str, dir: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("invalid manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A foreground object image and its category label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayAsset {
    pub path: PathBuf,
    pub label: String,
}

impl OverlayAsset {
    /// Decode the overlay as RGBA.
    pub fn load(&self) -> Result<RgbaImage, AssetError> {
        load_rgba(&self.path)
    }
}

/// A canvas image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundAsset {
    pub path: PathBuf,
}

impl BackgroundAsset {
    /// Decode the background as RGBA (opaque when the file has no alpha).
    pub fn load(&self) -> Result<RgbaImage, AssetError> {
        load_rgba(&self.path)
    }
}

/// Every overlay and background available to a run.
#[derive(Debug, Clone, Default)]
pub struct AssetLibrary {
    pub overlays: Vec<OverlayAsset>,
    pub backgrounds: Vec<BackgroundAsset>,
}

impl AssetLibrary {
    /// Discover assets in `overlays_dir` and `backgrounds_dir`.
    ///
    /// Files are sorted by name so a seeded run selects the same assets on
    /// every platform.
    ///
    /// # Errors
    ///
    /// * [`AssetError::MissingAssets`] if either directory has no images
    /// * [`AssetError::Io`] if a directory cannot be listed
    /// * [`AssetError::Manifest`] if `manifest.json` exists but is malformed
    pub fn load(overlays_dir: &Path, backgrounds_dir: &Path) -> Result<Self, AssetError> {
        let manifest = read_manifest(overlays_dir)?;

        let overlays: Vec<OverlayAsset> = list_images(overlays_dir)?
            .into_iter()
            .map(|path| {
                let label = label_for(&path, &manifest);
                debug!(path = %path.display(), %label, "registered overlay");
                OverlayAsset { path, label }
            })
            .collect();
        if overlays.is_empty() {
            return Err(AssetError::MissingAssets {
                kind: "overlay",
                dir: overlays_dir.to_path_buf(),
            });
        }

        let backgrounds: Vec<BackgroundAsset> = list_images(backgrounds_dir)?
            .into_iter()
            .map(|path| BackgroundAsset { path })
            .collect();
        if backgrounds.is_empty() {
            return Err(AssetError::MissingAssets {
                kind: "background",
                dir: backgrounds_dir.to_path_buf(),
            });
        }

        Ok(Self {
            overlays,
            backgrounds,
        })
    }
}

/// Category label encoded in a file stem.
///
/// `<category>_<qualifier>` gives `<category>`; a three-part stem
/// `<a>_<b>_<qualifier>` gives `<a>_<b>`, which is how multi-word
/// categories such as `no_left` are spelled.
pub fn label_from_stem(stem: &str) -> String {
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() == 3 {
        format!("{}_{}", parts[0], parts[1])
    } else {
        parts[0].to_string()
    }
}

/// Whether the path has one of [`IMAGE_EXTENSIONS`].
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Decode an image file and promote it to RGBA.
pub fn load_rgba(path: &Path) -> Result<RgbaImage, AssetError> {
    let bytes = fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let decode_err = |reason: String| AssetError::Decode {
        path: path.to_path_buf(),
        reason,
    };
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| decode_err(e.to_string()))?;
    let img = reader.decode().map_err(|e| decode_err(e.to_string()))?;

    Ok(img.into_rgba8())
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, AssetError> {
    let io_err = |source| AssetError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && is_image_file(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn read_manifest(overlays_dir: &Path) -> Result<BTreeMap<String, String>, AssetError> {
    let path = overlays_dir.join(MANIFEST_FILE);
    if !path.is_file() {
        return Ok(BTreeMap::new());
    }
    let text = fs::read_to_string(&path).map_err(|source| AssetError::Io {
        path: path.clone(),
        source,
    })?;
    let manifest: BTreeMap<String, String> =
        serde_json::from_str(&text).map_err(|source| AssetError::Manifest {
            path: path.clone(),
            source,
        })?;

    for file in manifest.keys() {
        if !overlays_dir.join(file).is_file() {
            warn!(file = %file, "manifest entry has no matching overlay");
        }
    }
    Ok(manifest)
}

fn label_for(path: &Path, manifest: &BTreeMap<String, String>) -> String {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    if let Some(label) = manifest.get(file_name) {
        return label.clone();
    }
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    label_from_stem(stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba};

    fn write_png(dir: &Path, name: &str) {
        RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn test_label_from_stem() {
        assert_eq!(label_from_stem("stop_01"), "stop");
        assert_eq!(label_from_stem("no_left_03"), "no_left");
        assert_eq!(label_from_stem("straight"), "straight");
        assert_eq!(label_from_stem("a_b_c_d"), "a");
    }

    #[test]
    fn test_is_image_file_case_insensitive() {
        assert!(is_image_file(Path::new("a/stop_01.PNG")));
        assert!(is_image_file(Path::new("bg.Jpeg")));
        assert!(is_image_file(Path::new("bg.jpg")));
        assert!(!is_image_file(Path::new("manifest.json")));
        assert!(!is_image_file(Path::new("noext")));
    }

    #[test]
    fn test_load_sorts_and_labels() {
        let signs = tempfile::tempdir().unwrap();
        let backgrounds = tempfile::tempdir().unwrap();
        write_png(signs.path(), "stop_02.png");
        write_png(signs.path(), "no_right_01.png");
        write_png(signs.path(), "left_01.png");
        std::fs::write(signs.path().join("notes.txt"), "ignored").unwrap();
        write_png(backgrounds.path(), "road.png");

        let library = AssetLibrary::load(signs.path(), backgrounds.path()).unwrap();
        let labels: Vec<&str> = library.overlays.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["left", "no_right", "stop"]);
        assert_eq!(library.backgrounds.len(), 1);
    }

    #[test]
    fn test_manifest_overrides_file_names() {
        let signs = tempfile::tempdir().unwrap();
        let backgrounds = tempfile::tempdir().unwrap();
        write_png(signs.path(), "sign_a.png");
        write_png(signs.path(), "stop_01.png");
        std::fs::write(
            signs.path().join(MANIFEST_FILE),
            r#"{"sign_a.png": "no_left"}"#,
        )
        .unwrap();
        write_png(backgrounds.path(), "road.png");

        let library = AssetLibrary::load(signs.path(), backgrounds.path()).unwrap();
        assert_eq!(library.overlays[0].label, "no_left");
        // Files absent from the manifest fall back to their stem
        assert_eq!(library.overlays[1].label, "stop");
    }

    #[test]
    fn test_malformed_manifest_errors() {
        let signs = tempfile::tempdir().unwrap();
        let backgrounds = tempfile::tempdir().unwrap();
        write_png(signs.path(), "stop_01.png");
        std::fs::write(signs.path().join(MANIFEST_FILE), "[1, 2").unwrap();
        write_png(backgrounds.path(), "road.png");

        let err = AssetLibrary::load(signs.path(), backgrounds.path()).unwrap_err();
        assert!(matches!(err, AssetError::Manifest { .. }));
    }

    #[test]
    fn test_missing_assets() {
        let signs = tempfile::tempdir().unwrap();
        let backgrounds = tempfile::tempdir().unwrap();
        write_png(backgrounds.path(), "road.png");

        let err = AssetLibrary::load(signs.path(), backgrounds.path()).unwrap_err();
        assert!(matches!(err, AssetError::MissingAssets { kind: "overlay", .. }));

        write_png(signs.path(), "stop_01.png");
        let empty = tempfile::tempdir().unwrap();
        let err = AssetLibrary::load(signs.path(), empty.path()).unwrap_err();
        assert!(matches!(err, AssetError::MissingAssets { kind: "background", .. }));
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let root = tempfile::tempdir().unwrap();
        let err = AssetLibrary::load(&root.path().join("nope"), root.path()).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn test_rgb_asset_promoted_to_opaque_rgba() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bg.png");
        RgbImage::from_pixel(3, 2, Rgb([1, 2, 3])).save(&path).unwrap();

        let img = load_rgba(&path).unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        assert!(img.pixels().all(|p| p.0 == [1, 2, 3, 255]));
    }

    #[test]
    fn test_corrupt_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let asset = OverlayAsset {
            path,
            label: "stop".into(),
        };
        assert!(matches!(asset.load(), Err(AssetError::Decode { .. })));
    }
}
