//! Responsive picture builder.
//!
//! Turns one source image into a `<picture>` fragment: a `<source>` per
//! configured format listing width-annotated variants, followed by a single
//! fallback `<img>`.
//!
//! ```text
//! <picture>
//!   <source srcset="/picturize/a.jpg.Xk3_a9QmZ0.640.60.avif 640w, ..." type="image/avif">
//!   <source srcset="/picturize/a.jpg.Xk3_a9QmZ0.640.80.webp 640w, ..." type="image/webp">
//!   <img src="/picturize/a.jpg.Xk3_a9QmZ0.360.50.jpeg" alt="..." width="2000" height="1500"
//!        loading="lazy" decoding="async">
//! </picture>
//! ```
//!
//! The source is read and decoded once. Widths of one format are resolved in
//! parallel on the rayon pool, all sharing the decoded pixels. Any variant
//! failure aborts the whole picture; isolation happens one level up in the
//! batch driver.

use crate::cache::{VariantCache, VariantStatus, content_hash};
use crate::config::Config;
use crate::error::PictureError;
use crate::imaging::{DecodedImage, Format, ImageBackend, VariantSpec, compute_widths};
use crate::naming::{url_join, variant_filename};
use crate::tree::Element;
use maud::{Markup, Render, html};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A source image read from disk and decoded.
pub struct SourceImage {
    pub path: PathBuf,
    pub decoded: DecodedImage,
    pub width: u32,
    pub height: u32,
    pub format: Format,
    /// Final path component, used as the variant filename prefix.
    pub base_name: String,
    /// [`content_hash`] of the raw bytes.
    pub hash: String,
}

impl SourceImage {
    pub fn load(backend: &impl ImageBackend, path: &Path) -> Result<Self, PictureError> {
        let bytes = std::fs::read(path).map_err(|source| PictureError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let decoded = backend
            .decode(&bytes)
            .map_err(|e| PictureError::invalid_metadata(path, e.to_string()))?;

        let meta = decoded.metadata;
        let width = meta
            .width
            .ok_or_else(|| PictureError::invalid_metadata(path, "missing width"))?;
        let height = meta
            .height
            .ok_or_else(|| PictureError::invalid_metadata(path, "missing height"))?;
        let format = meta
            .format
            .ok_or_else(|| PictureError::invalid_metadata(path, "unsupported format"))?;
        let base_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| PictureError::invalid_metadata(path, "no file name"))?;

        Ok(Self {
            path: path.to_path_buf(),
            decoded,
            width,
            height,
            format,
            base_name,
            hash: content_hash(&bytes),
        })
    }
}

/// One `<source>` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PictureSource {
    pub srcset: String,
    pub mime_type: String,
    pub sizes: Option<String>,
}

/// The terminal `<img>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallbackImage {
    pub src: String,
    pub alt: String,
    /// Native dimensions of the source, not of the fallback variant.
    pub width: u32,
    pub height: u32,
}

/// A complete responsive fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Picture {
    pub sources: Vec<PictureSource>,
    pub fallback: FallbackImage,
}

impl Picture {
    /// The fragment as a document tree element.
    pub fn to_element(&self) -> Element {
        let mut picture = Element::new("picture");
        for source in &self.sources {
            let mut el = Element::new("source")
                .with_attr("srcset", source.srcset.as_str())
                .with_attr("type", source.mime_type.as_str());
            if let Some(sizes) = &source.sizes {
                el.set_attr("sizes", sizes.as_str());
            }
            picture.children.push(el.into());
        }
        let img = Element::new("img")
            .with_attr("src", self.fallback.src.as_str())
            .with_attr("alt", self.fallback.alt.as_str())
            .with_attr("width", self.fallback.width.to_string())
            .with_attr("height", self.fallback.height.to_string())
            .with_attr("loading", "lazy")
            .with_attr("decoding", "async");
        picture.with_child(img)
    }
}

impl Render for Picture {
    fn render(&self) -> Markup {
        html! {
            picture {
                @for s in &self.sources {
                    source srcset=(s.srcset) type=(s.mime_type) sizes=[s.sizes.as_deref()];
                }
                img src=(self.fallback.src) alt=(self.fallback.alt)
                    width=(self.fallback.width) height=(self.fallback.height)
                    loading="lazy" decoding="async";
            }
        }
    }
}

/// Outcome for one produced file, for progress output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantInfo {
    /// Human-readable label, e.g. "webp 640w".
    pub label: String,
    pub status: VariantStatus,
}

/// A fragment plus how each of its files was produced.
#[derive(Debug, Clone, Serialize)]
pub struct BuiltPicture {
    pub picture: Picture,
    pub variants: Vec<VariantInfo>,
}

fn public_url(config: &Config, filename: &str) -> String {
    url_join(&[&config.base_url, &config.folder_name, filename])
}

/// Build the responsive fragment for `source_path`.
///
/// The cache's directories must already exist (see
/// [`VariantCache::ensure_dirs`]). `alt` falls back to
/// [`Config::default_alt`] when absent or empty.
pub fn build_picture(
    backend: &impl ImageBackend,
    config: &Config,
    cache: &VariantCache,
    source_path: &Path,
    alt: Option<&str>,
) -> Result<BuiltPicture, PictureError> {
    let source = SourceImage::load(backend, source_path)?;
    let mut variants = Vec::new();
    let mut sources = Vec::with_capacity(config.formats.len());

    for (index, &format) in config.formats.iter().enumerate() {
        let quality = config.quality_for(index);
        let widths = compute_widths(
            source_path,
            &config.widths,
            &source.decoded.metadata,
            format,
            config.include_original_image,
        )?;

        let resolved = widths
            .par_iter()
            .map(|&width| -> Result<(u32, String, VariantStatus), PictureError> {
                let spec = VariantSpec {
                    format,
                    quality,
                    width,
                };
                let filename = variant_filename(&source.base_name, &source.hash, &spec);
                let status = cache.resolve(backend, &source.decoded, &filename, &spec)?;
                Ok((width, public_url(config, &filename), status))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut candidates = Vec::with_capacity(resolved.len() + 1);
        for (width, url, status) in resolved {
            candidates.push(format!("{} {}w", url, width));
            variants.push(VariantInfo {
                label: format!("{} {}w", format, width),
                status,
            });
        }

        if config.include_original_image && source.format == format {
            let status = copy_original(&source, cache)?;
            candidates.push(format!(
                "{} {}w",
                public_url(config, &source.base_name),
                source.width
            ));
            variants.push(VariantInfo {
                label: format!("{} original", format),
                status,
            });
        }

        sources.push(PictureSource {
            srcset: candidates.join(", "),
            mime_type: format.mime_type(),
            sizes: config.sizes_for(index).map(str::to_string),
        });
    }

    let spec = VariantSpec {
        format: config.default_image.format,
        quality: config.default_quality(),
        width: config.default_image.width.min(source.width),
    };
    let filename = variant_filename(&source.base_name, &source.hash, &spec);
    let status = cache.resolve(backend, &source.decoded, &filename, &spec)?;
    variants.push(VariantInfo {
        label: format!("fallback {} {}w", spec.format, spec.width),
        status,
    });

    let alt = alt
        .filter(|a| !a.is_empty())
        .unwrap_or(config.default_alt.as_str())
        .to_string();

    Ok(BuiltPicture {
        picture: Picture {
            sources,
            fallback: FallbackImage {
                src: public_url(config, &filename),
                alt,
                width: source.width,
                height: source.height,
            },
        },
        variants,
    })
}

/// Copy the untouched source next to its variants.
fn copy_original(source: &SourceImage, cache: &VariantCache) -> Result<VariantStatus, PictureError> {
    let dest = cache.out_dir().join(&source.base_name);
    std::fs::copy(&source.path, &dest).map_err(|e| PictureError::write(&dest, e))?;
    Ok(VariantStatus::Copied)
}
