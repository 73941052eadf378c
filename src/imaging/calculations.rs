//! Pure calculation functions for variant sizing.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::ImageMetadata;
use super::params::Format;
use crate::error::PictureError;
use std::path::Path;

/// Calculate which widths to generate for one target format.
///
/// 1. Every configured width is clipped to the native width.
/// 2. The result is de-duplicated and sorted ascending.
/// 3. When the original image is included in the srcset and the target
///    format matches the native format, a variant at exactly the native
///    width would duplicate the original, so it is dropped.
///
/// # Errors
/// [`PictureError::InvalidMetadata`] when the native width or format is unknown.
///
/// # Examples
/// ```
/// # use picturize::imaging::{Format, ImageMetadata, compute_widths};
/// # use std::path::Path;
/// let meta = ImageMetadata { width: Some(1000), height: Some(800), format: Some(Format::Jpeg) };
/// let widths = compute_widths(Path::new("a.jpg"), &[640, 1280, 1920], &meta, Format::Webp, false).unwrap();
/// assert_eq!(widths, vec![640, 1000]);
/// ```
pub fn compute_widths(
    source: &Path,
    configured: &[u32],
    metadata: &ImageMetadata,
    target: Format,
    include_original: bool,
) -> Result<Vec<u32>, PictureError> {
    let native_width = metadata
        .width
        .ok_or_else(|| PictureError::invalid_metadata(source, "missing width"))?;
    let native_format = metadata
        .format
        .ok_or_else(|| PictureError::invalid_metadata(source, "missing format"))?;

    let mut widths: Vec<u32> = configured
        .iter()
        .map(|&w| w.min(native_width))
        .collect();
    widths.sort_unstable();
    widths.dedup();

    if include_original && native_format == target && widths.last() == Some(&native_width) {
        widths.pop();
    }

    Ok(widths)
}

/// Height of a resize to `width`, preserving the native aspect ratio.
///
/// Never returns zero, so very wide images still produce a 1px-tall variant.
pub fn scaled_height(native: (u32, u32), width: u32) -> u32 {
    let (native_w, native_h) = native;
    if native_w == 0 {
        return native_h.max(1);
    }
    let h = (native_h as f64 * width as f64 / native_w as f64).round() as u32;
    h.max(1)
}
