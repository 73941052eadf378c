//! Variant cache for incremental builds.
//!
//! Encoding is the bottleneck of the pipeline: a single source at three
//! widths and two formats can take several seconds through rav1e. This
//! module lets a build skip encoding when an identical variant was produced
//! by a previous build.
//!
//! # Design
//!
//! The cache is **content-addressed by filename**. A variant's filename
//! embeds the source's [`content_hash`] together with width, quality, and
//! format (see [`naming::variant_filename`](crate::naming::variant_filename)),
//! so "is this variant cached?" is simply "does a file with this name exist
//! in the cache directory?". There is no manifest to load or keep in sync.
//!
//! - **Content hash**: SHA-256 of the raw source bytes, base64url-encoded and
//!   truncated to [`HASH_LEN`] characters. Content-based rather than
//!   mtime-based so it survives `git checkout`. It is a cache key, not an
//!   integrity check; the truncation keeps filenames short.
//!
//! ## Storage
//!
//! ```text
//! {cache_dir}/{folder}/photo.jpg.Xk3_a9QmZ0.640.70.webp   ← durable, survives builds
//! {out_dir}/{folder}/photo.jpg.Xk3_a9QmZ0.640.70.webp     ← this build's output
//! ```
//!
//! A hit copies cache → output. A miss encodes into output, then copies
//! output → cache. Cache files are advisory: a copy that fails for any
//! reason (missing, concurrently deleted, unreadable) is treated as a miss
//! and the variant is regenerated.
//!
//! ## Bypassing the cache
//!
//! Pass `--no-cache` to `build` or `picture` to re-encode everything. Fresh
//! encodes still refresh the cache directory.

use crate::config::Config;
use crate::error::PictureError;
use crate::imaging::{DecodedImage, EncodeParams, ImageBackend, VariantSpec, scaled_height};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};

/// Number of base64url characters kept from the digest.
pub const HASH_LEN: usize = 10;

/// Short, filename-safe identity of a source image's bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut encoded = URL_SAFE_NO_PAD.encode(digest);
    encoded.truncate(HASH_LEN);
    encoded
}

/// How a variant ended up in the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantStatus {
    /// Copied from the cache directory; no pixel work.
    Cached,
    /// Source file copied verbatim (original image passthrough).
    Copied,
    /// Resized and encoded during this build.
    Encoded,
}

/// Cache and output locations for one build, already scoped to the
/// configured folder name.
#[derive(Debug, Clone)]
pub struct VariantCache {
    cache_dir: PathBuf,
    out_dir: PathBuf,
    read_enabled: bool,
}

impl VariantCache {
    pub fn new(cache_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            out_dir: out_dir.into(),
            read_enabled: true,
        }
    }

    /// Locations from `config`, with cache reads on or off.
    pub fn for_config(config: &Config, use_cache: bool) -> Self {
        let cache = Self::new(config.variant_cache_dir(), config.variant_out_dir());
        if use_cache { cache } else { cache.without_reads() }
    }

    /// Skip cache lookups; every variant is re-encoded.
    pub fn without_reads(mut self) -> Self {
        self.read_enabled = false;
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Create both directories. Already existing is fine.
    pub fn ensure_dirs(&self) -> Result<(), PictureError> {
        for dir in [&self.cache_dir, &self.out_dir] {
            std::fs::create_dir_all(dir).map_err(|e| PictureError::write(dir, e))?;
        }
        Ok(())
    }

    /// Make sure `filename` exists in the output directory.
    ///
    /// Served from the cache directory when possible; otherwise `image` is
    /// resized and encoded per `spec`, and the result is copied back into
    /// the cache for future builds.
    pub fn resolve(
        &self,
        backend: &impl ImageBackend,
        image: &DecodedImage,
        filename: &str,
        spec: &VariantSpec,
    ) -> Result<VariantStatus, PictureError> {
        let cache_path = self.cache_dir.join(filename);
        let out_path = self.out_dir.join(filename);

        if self.read_enabled {
            match std::fs::copy(&cache_path, &out_path) {
                Ok(_) => {
                    tracing::debug!(file = filename, "served from cache");
                    return Ok(VariantStatus::Cached);
                }
                Err(e) => {
                    tracing::trace!(file = filename, error = %e, "cache miss");
                }
            }
        }

        let native = (
            image.metadata.width.unwrap_or(spec.width),
            image.metadata.height.unwrap_or(spec.width),
        );
        let params = EncodeParams {
            output: out_path.clone(),
            width: spec.width,
            height: scaled_height(native, spec.width),
            format: spec.format,
            quality: spec.quality,
        };
        backend
            .encode(image, &params)
            .map_err(|e| PictureError::write(&out_path, e))?;
        std::fs::copy(&out_path, &cache_path).map_err(|e| PictureError::write(&cache_path, e))?;

        tracing::debug!(file = filename, "generated");
        Ok(VariantStatus::Encoded)
    }
}

/// Summary of cache performance for a build run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub copies: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn record(&mut self, status: VariantStatus) {
        match status {
            VariantStatus::Cached => self.hits += 1,
            VariantStatus::Copied => self.copies += 1,
            VariantStatus::Encoded => self.misses += 1,
        }
    }

    pub fn merge(&mut self, other: &CacheStats) {
        self.hits += other.hits;
        self.copies += other.copies;
        self.misses += other.misses;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.copies + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 || self.copies > 0 {
            if self.copies > 0 {
                write!(
                    f,
                    "{} cached, {} copied, {} encoded ({} total)",
                    self.hits,
                    self.copies,
                    self.misses,
                    self.total()
                )
            } else {
                write!(
                    f,
                    "{} cached, {} encoded ({} total)",
                    self.hits,
                    self.misses,
                    self.total()
                )
            }
        } else {
            write!(f, "{} encoded", self.misses)
        }
    }
}
