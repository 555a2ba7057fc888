use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use signsynth_core::{write_dataset_json, CompositionPipeline, GeneratorConfig};
use tracing::{info, Level};

/// Generate a synthetic sign-detection dataset.
///
/// Long flags keep their snake_case spelling (`--number_of_images`).
#[derive(Parser, Debug)]
#[command(name = "signsynth", version)]
struct Cli {
    /// JSON config file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resize backgrounds to --width x --height.
    #[arg(long)]
    resize: bool,

    /// Target background width when resizing.
    #[arg(long)]
    width: Option<u32>,

    /// Target background height when resizing.
    #[arg(long)]
    height: Option<u32>,

    /// Number of images to generate.
    #[arg(long = "number_of_images")]
    number_of_images: Option<u32>,

    /// Directory of overlay (sign) images.
    #[arg(long = "overlays_path")]
    overlays_path: Option<PathBuf>,

    /// Directory of background images.
    #[arg(long = "backgrounds_path")]
    backgrounds_path: Option<PathBuf>,

    /// Directory for generated images.
    #[arg(long = "images_save_path")]
    images_save_path: Option<PathBuf>,

    /// Directory for the annotation JSON.
    #[arg(long = "annotation_save_path")]
    annotation_save_path: Option<PathBuf>,

    /// Annotation file name without extension.
    #[arg(long = "annotation_filename")]
    annotation_filename: Option<String>,

    /// Seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,

    /// Also save each placed overlay as <idx>_<i>.png.
    #[arg(long = "save_overlay_crops")]
    save_overlay_crops: bool,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<GeneratorConfig> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::from_json_file(path)?,
            None => GeneratorConfig::default(),
        };

        config.resize |= self.resize;
        config.save_overlay_crops |= self.save_overlay_crops;
        if let Some(v) = self.width {
            config.width = v;
        }
        if let Some(v) = self.height {
            config.height = v;
        }
        if let Some(v) = self.number_of_images {
            config.number_of_images = v;
        }
        if let Some(v) = self.overlays_path {
            config.overlays_path = v;
        }
        if let Some(v) = self.backgrounds_path {
            config.backgrounds_path = v;
        }
        if let Some(v) = self.images_save_path {
            config.images_save_path = v;
        }
        if let Some(v) = self.annotation_save_path {
            config.annotation_save_path = v;
        }
        if let Some(v) = self.annotation_filename {
            config.annotation_filename = v;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = cli.into_config()?;

    std::fs::create_dir_all(&config.images_save_path).with_context(|| {
        format!(
            "create images dir '{}'",
            config.images_save_path.display()
        )
    })?;
    std::fs::create_dir_all(&config.annotation_save_path).with_context(|| {
        format!(
            "create annotation dir '{}'",
            config.annotation_save_path.display()
        )
    })?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let annotation_path = config.annotation_path();
    let pipeline = CompositionPipeline::from_config(config).context("load assets")?;
    let dataset = pipeline.run(&mut rng)?;

    write_dataset_json(&dataset, &annotation_path)
        .with_context(|| format!("write annotations '{}'", annotation_path.display()))?;
    info!(
        images = dataset.images.len(),
        annotations = dataset.annotations.len(),
        path = %annotation_path.display(),
        "wrote dataset"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::ffi::OsString;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_without_flags() {
        let config = Cli::parse_from(["signsynth"]).into_config().unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "signsynth",
            "--resize",
            "--width",
            "320",
            "--number_of_images",
            "7",
            "--overlays_path",
            "my_signs",
            "--seed",
            "42",
            "-v",
        ]);
        assert!(cli.verbose);
        let config = cli.into_config().unwrap();
        assert!(config.resize);
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 180);
        assert_eq!(config.number_of_images, 7);
        assert_eq!(config.overlays_path, PathBuf::from("my_signs"));
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, r#"{"number_of_images": 3, "width": 100, "seed": 1}"#).unwrap();

        let args: Vec<OsString> = vec![
            "signsynth".into(),
            "--config".into(),
            path.into_os_string(),
            "--width".into(),
            "640".into(),
        ];
        let config = Cli::parse_from(args)
        .into_config()
        .unwrap();
        assert_eq!(config.number_of_images, 3);
        assert_eq!(config.width, 640);
        assert_eq!(config.seed, Some(1));
    }

    #[test]
    fn test_invalid_resize_target_rejected() {
        let cli = Cli::parse_from(["signsynth", "--resize", "--height", "0"]);
        assert!(cli.into_config().is_err());
    }
}
