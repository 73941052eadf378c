//! Parameter types for image operations.
//!
//! These structs describe *what* to produce, not *how*. They are the
//! interface between the [`cache`](crate::cache) / [`picture`](crate::picture)
//! modules (which decide which variants exist) and the
//! [`backend`](super::backend) (which does the pixel work). Swapping the
//! backend for a mock in tests leaves all naming and sizing logic intact.
//!
//! ## Types
//!
//! - [`Format`]: Closed set of image formats, named the way they appear in filenames.
//! - [`Quality`]: Lossy encoding quality (1-100). Clamped on construction.
//! - [`VariantSpec`]: One requested output: format, quality, width.
//! - [`EncodeParams`]: Everything one encode needs: output path and target size.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Image formats that can appear as a source or as a variant target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Jpeg,
    Png,
    Webp,
    Avif,
    Tiff,
}

impl Format {
    /// Lowercase name used in variant filenames and config files.
    pub fn name(self) -> &'static str {
        match self {
            Format::Jpeg => "jpeg",
            Format::Png => "png",
            Format::Webp => "webp",
            Format::Avif => "avif",
            Format::Tiff => "tiff",
        }
    }

    /// MIME type advertised on `<source type=...>`.
    pub fn mime_type(self) -> String {
        format!("image/{}", self.name())
    }

    /// Map a format detected by the `image` crate. Anything outside the
    /// closed set (GIF, BMP, ...) has no native format here.
    pub fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(Format::Jpeg),
            image::ImageFormat::Png => Some(Format::Png),
            image::ImageFormat::WebP => Some(Format::Webp),
            image::ImageFormat::Avif => Some(Format::Avif),
            image::ImageFormat::Tiff => Some(Format::Tiff),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// One requested output variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariantSpec {
    pub format: Format,
    pub quality: Quality,
    pub width: u32,
}

/// Parameters for a resize + transcode operation.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeParams {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub format: Format,
    pub quality: Quality,
}
