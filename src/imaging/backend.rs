//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the variant cache
//! needs: decode raw bytes once, then encode any number of resized variants
//! from that decoded handle.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): pure Rust, everything
//! statically linked into the binary.

use super::params::{EncodeParams, Format};
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Native properties of a decoded source image.
///
/// Every field is optional: a backend reports what it could determine and
/// the caller decides whether the image is usable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageMetadata {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: Option<Format>,
}

/// A decoded source image.
///
/// Treated as read-only once decoded: every variant is an independent
/// resize of the same pixels, so one handle is shared across all variants
/// (and across rayon workers).
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub metadata: ImageMetadata,
    pub(crate) pixels: DynamicImage,
}

impl DecodedImage {
    pub fn new(metadata: ImageMetadata, pixels: DynamicImage) -> Self {
        Self { metadata, pixels }
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }
}

/// Trait for image processing backends.
pub trait ImageBackend: Sync {
    /// Decode raw file bytes and report native metadata.
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, BackendError>;

    /// Resize `image` and write it to `params.output` in `params.format`.
    fn encode(&self, image: &DecodedImage, params: &EncodeParams) -> Result<(), BackendError>;
}
