//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate (pure Rust decoders), format sniffed from bytes |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the requested quality |
//! | Encode → WebP | `webp::Encoder` (libwebp, lossy) at the requested quality |
//! | Encode → PNG / TIFF | lossless; quality is ignored |

use super::backend::{BackendError, DecodedImage, ImageBackend, ImageMetadata};
use super::params::{EncodeParams, Format};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::fs::File;
use std::io::{BufWriter, Cursor};

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize pixel layout to what every encoder accepts: 8-bit RGB, or RGBA
/// when the source has alpha and the target can carry it.
fn encodable_pixels(img: DynamicImage, format: Format) -> DynamicImage {
    let keep_alpha = img.color().has_alpha() && format != Format::Jpeg;
    if keep_alpha {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    }
}

/// Encode and save `img` to `params.output`.
fn save_image(img: &DynamicImage, params: &EncodeParams) -> Result<(), BackendError> {
    let quality = params.quality.value() as u8;

    let result = match params.format {
        Format::Webp => return save_webp(img, params),
        Format::Avif => img.write_with_encoder(
            image::codecs::avif::AvifEncoder::new_with_speed_quality(create(params)?, 6, quality),
        ),
        Format::Jpeg => img.write_with_encoder(
            image::codecs::jpeg::JpegEncoder::new_with_quality(create(params)?, quality),
        ),
        Format::Png => img.write_with_encoder(image::codecs::png::PngEncoder::new(create(params)?)),
        Format::Tiff => {
            img.write_with_encoder(image::codecs::tiff::TiffEncoder::new(create(params)?))
        }
    };

    result.map_err(|e| encode_error(params, e))
}

fn create(params: &EncodeParams) -> Result<BufWriter<File>, BackendError> {
    Ok(BufWriter::new(File::create(&params.output)?))
}

/// Lossy WebP through libwebp; the `image` crate only encodes lossless.
fn save_webp(img: &DynamicImage, params: &EncodeParams) -> Result<(), BackendError> {
    let encoder = webp::Encoder::from_image(img).map_err(|e| encode_error(params, e))?;
    let encoded = encoder.encode(params.quality.value() as f32);
    std::fs::write(&params.output, &*encoded)?;
    Ok(())
}

fn encode_error(params: &EncodeParams, e: impl std::fmt::Display) -> BackendError {
    BackendError::Encode(format!(
        "{} encode of {} failed: {}",
        params.format,
        params.output.display(),
        e
    ))
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, BackendError> {
        let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
        let format = reader.format();
        let pixels = reader
            .decode()
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        let metadata = ImageMetadata {
            width: Some(pixels.width()).filter(|&w| w > 0),
            height: Some(pixels.height()).filter(|&h| h > 0),
            format: format.and_then(Format::from_image_format),
        };
        Ok(DecodedImage::new(metadata, pixels))
    }

    fn encode(&self, image: &DecodedImage, params: &EncodeParams) -> Result<(), BackendError> {
        let resized = image
            .pixels()
            .resize_exact(params.width, params.height, FilterType::Lanczos3);
        let ready = encodable_pixels(resized, params.format);
        save_image(&ready, params)
    }
}
