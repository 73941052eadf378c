//! Build configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by a sparse `config.toml` in the content root; only the keys a
//! user sets are replaced.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! folder_name = "picturize"     # Subfolder for variants in cache and output
//! formats = ["avif", "webp"]    # One <source> per format, in this order
//! qualities = [60, 80]          # Parallel to formats
//! widths = [640, 1280, 1920]    # Candidate widths, clipped to the source
//! # sizes = ["100vw", "100vw"]  # Optional, parallel to formats
//! include_original_image = false
//! out_dir = "dist"
//! cache_dir = ".cache"
//! base_url = "/"
//! default_alt = "This is da image!"
//!
//! [default_image]
//! format = "jpeg"
//! quality = 50
//! width = 360
//!
//! [processing]
//! max_processes = 4             # Max parallel encoders (omit for auto)
//! ```
//!
//! ## Shape warnings
//!
//! `qualities` and `sizes` are read by index alongside `formats`. A length
//! mismatch is not fatal: it is reported as a [`ConfigWarning`] and a format
//! without a quality is encoded at [`Quality::default`].
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Format, Quality};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Build configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Subfolder holding variants, under both `cache_dir` and `out_dir`.
    pub folder_name: String,
    /// Target formats, one `<source>` each, in emission order.
    pub formats: Vec<Format>,
    /// Encoding quality per format (parallel to `formats`).
    pub qualities: Vec<u32>,
    /// Candidate variant widths in pixels.
    pub widths: Vec<u32>,
    /// Optional `sizes` attribute per format (parallel to `formats`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Vec<String>>,
    /// Add the untouched source to the srcset of its own format.
    pub include_original_image: bool,
    /// The single fallback `<img>` variant.
    pub default_image: DefaultImage,
    /// Build output root.
    pub out_dir: String,
    /// Durable cross-build variant storage.
    pub cache_dir: String,
    /// Public URL prefix for generated files.
    pub base_url: String,
    /// Alt text used when an image reference has none.
    pub default_alt: String,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            folder_name: "picturize".to_string(),
            formats: vec![Format::Avif, Format::Webp],
            qualities: vec![60, 80],
            widths: vec![640, 1280, 1920],
            sizes: None,
            include_original_image: false,
            default_image: DefaultImage::default(),
            out_dir: "dist".to_string(),
            cache_dir: ".cache".to_string(),
            base_url: "/".to_string(),
            default_alt: "This is da image!".to_string(),
            processing: ProcessingConfig::default(),
        }
    }
}

/// Settings for the fallback `<img>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultImage {
    pub format: Format,
    pub quality: u32,
    /// Upper bound; the source width wins when smaller.
    pub width: u32,
}

impl Default for DefaultImage {
    fn default() -> Self {
        Self {
            format: Format::Jpeg,
            quality: 50,
            width: 360,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel encode workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Non-fatal configuration shape problems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    QualityCountMismatch { formats: usize, qualities: usize },
    SizesCountMismatch { formats: usize, sizes: usize },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QualityCountMismatch { formats, qualities } => write!(
                f,
                "{} formats but {} qualities; formats without a quality use {}",
                formats,
                qualities,
                Quality::default().value()
            ),
            Self::SizesCountMismatch { formats, sizes } => write!(
                f,
                "{} formats but {} sizes; formats without sizes get no sizes attribute",
                formats, sizes
            ),
        }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.folder_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "folder_name must not be empty".into(),
            ));
        }
        if self.formats.is_empty() {
            return Err(ConfigError::Validation("formats must not be empty".into()));
        }
        if self.qualities.iter().any(|&q| q == 0 || q > 100) {
            return Err(ConfigError::Validation("qualities must be 1-100".into()));
        }
        if self.widths.contains(&0) {
            return Err(ConfigError::Validation(
                "widths must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.default_image.quality) {
            return Err(ConfigError::Validation(
                "default_image.quality must be 1-100".into(),
            ));
        }
        if self.default_image.width == 0 {
            return Err(ConfigError::Validation(
                "default_image.width must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Shape mismatches between the parallel per-format lists.
    pub fn warnings(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        if self.formats.len() != self.qualities.len() {
            warnings.push(ConfigWarning::QualityCountMismatch {
                formats: self.formats.len(),
                qualities: self.qualities.len(),
            });
        }
        match &self.sizes {
            Some(sizes) if sizes.len() != self.formats.len() => {
                warnings.push(ConfigWarning::SizesCountMismatch {
                    formats: self.formats.len(),
                    sizes: sizes.len(),
                });
            }
            _ => {}
        }
        warnings
    }

    /// Quality for the format at `index`.
    pub fn quality_for(&self, index: usize) -> Quality {
        self.qualities
            .get(index)
            .map(|&q| Quality::new(q))
            .unwrap_or_default()
    }

    /// `sizes` hint for the format at `index`, if configured.
    pub fn sizes_for(&self, index: usize) -> Option<&str> {
        self.sizes
            .as_ref()
            .and_then(|sizes| sizes.get(index))
            .map(String::as_str)
    }

    pub fn default_quality(&self) -> Quality {
        Quality::new(self.default_image.quality)
    }

    /// `{cache_dir}/{folder_name}`
    pub fn variant_cache_dir(&self) -> PathBuf {
        Path::new(&self.cache_dir).join(&self.folder_name)
    }

    /// `{out_dir}/{folder_name}`
    pub fn variant_out_dir(&self) -> PathBuf {
        Path::new(&self.out_dir).join(&self.folder_name)
    }
}

/// A validated config plus the shape warnings found while building it.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: Config,
    pub warnings: Vec<ConfigWarning>,
}

/// Stock defaults as a TOML value, the base layer for merging.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Config::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` into `base`. Tables merge key by key; any
/// other value in the overlay replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read `config.toml` from `dir` as an untyped value, if present.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge, deserialize, validate, and collect warnings.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ResolvedConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    let warnings = config.warnings();
    Ok(ResolvedConfig { config, warnings })
}

/// Stock defaults overlaid with `{root}/config.toml`.
pub fn load_config(root: &Path) -> Result<ResolvedConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// A fully documented `config.toml` with every key at its default.
pub fn stock_config_toml() -> &'static str {
    r##"# picturize configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file at the root of the content directory.
# Unknown keys will cause an error.

# Subfolder for generated variants, used under both out_dir and cache_dir.
folder_name = "picturize"

# ---------------------------------------------------------------------------
# Variants
# ---------------------------------------------------------------------------
# One <source> element per format, emitted in this order.
# Supported: "avif", "webp", "jpeg", "png", "tiff".
formats = ["avif", "webp"]

# Encoding quality per format, matched by position (1-100).
# A format without a quality here is encoded at 80.
qualities = [60, 80]

# Candidate widths in pixels. Widths larger than the source are clipped
# to the source width, then de-duplicated.
widths = [640, 1280, 1920]

# Optional `sizes` attribute per format, matched by position.
# sizes = ["(min-width: 60rem) 50vw, 100vw", "(min-width: 60rem) 50vw, 100vw"]

# Copy the untouched source into the output and list it in the srcset of
# its own format. The same-size variant is then skipped.
include_original_image = false

# ---------------------------------------------------------------------------
# Locations
# ---------------------------------------------------------------------------
out_dir = "dist"
cache_dir = ".cache"

# Public URL prefix for generated files.
base_url = "/"

# Alt text for images that have none.
default_alt = "This is da image!"

# ---------------------------------------------------------------------------
# Fallback <img>
# ---------------------------------------------------------------------------
[default_image]
format = "jpeg"
quality = 50
# Upper bound; smaller sources keep their own width.
width = 360

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel encode workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
