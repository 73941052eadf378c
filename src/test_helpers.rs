//! Shared test utilities for the picturize test suite.
//!
//! Provides synthetic image bytes, source-file setup, and a small config
//! rooted in a temp directory.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let config = test_config(tmp.path());
//! let cache = test_cache(&config);
//! let path = write_source(tmp.path(), "photo.jpg", &jpeg_bytes(200, 100));
//! ```

use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::cache::VariantCache;
use crate::config::Config;
use crate::imaging::Format;

// =========================================================================
// Synthetic images
// =========================================================================

fn gradient(width: u32, height: u32) -> image::RgbImage {
    image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

fn encode(img: image::RgbImage, format: image::ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}

/// A real JPEG of the given size.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(gradient(width, height), image::ImageFormat::Jpeg)
}

/// A real PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(gradient(width, height), image::ImageFormat::Png)
}

// =========================================================================
// Filesystem setup
// =========================================================================

/// Write `bytes` to `dir/name`, creating parent directories.
pub fn write_source(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, bytes).unwrap();
    path
}

/// One webp source at 640/1280/1920 plus a 360px jpeg fallback, with
/// every location under `root` and variants in the `img` folder.
pub fn test_config(root: &Path) -> Config {
    Config {
        folder_name: "img".into(),
        formats: vec![Format::Webp],
        qualities: vec![70],
        widths: vec![640, 1280, 1920],
        out_dir: root.join("dist").to_string_lossy().into_owned(),
        cache_dir: root.join("cache").to_string_lossy().into_owned(),
        base_url: "/".into(),
        ..Config::default()
    }
}

/// A cache for `config` with its directories already created.
pub fn test_cache(config: &Config) -> VariantCache {
    let cache = VariantCache::for_config(config, true);
    cache.ensure_dirs().unwrap();
    cache
}
