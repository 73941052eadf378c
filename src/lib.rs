//! # Picturize
//!
//! Responsive image variants for static documents. Every relative `<img>` in
//! a document becomes a `<picture>` element whose `<source>` children list
//! resized, transcoded copies of the original, plus a small fallback `<img>`
//! for browsers that ignore `<source>`.
//!
//! # Architecture
//!
//! ```text
//! markdown ──► tree::Root ──► process_tree ──► build_picture ──► VariantCache
//!                                  │                                │
//!                                  ▼                                ▼
//!                           <picture> nodes                 cache_dir ─copy─► out_dir
//! ```
//!
//! A variant is identified by its file name alone: source base name, a short
//! content hash of the source bytes, width, quality and format. Because the
//! name changes whenever any input changes, a file with the right name in the
//! cache directory is always correct and can be copied without decoding.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`naming`] | Variant file names and public URL joining |
//! | [`cache`] | Content hashing, cache lookup, encode-on-miss, cache statistics |
//! | [`picture`] | Builds one `<picture>` fragment for one source image |
//! | [`process`] | Finds eligible `img` elements in a tree and swaps in pictures |
//! | [`tree`] | Minimal HTML element tree with index-path addressing |
//! | [`markdown`] | Markdown to [`tree::Root`] conversion |
//! | [`generate`] | Whole-site build: documents in, HTML pages out |
//! | [`config`] | `config.toml` loading, stock defaults, validation, warnings |
//! | [`imaging`] | Pure-Rust decode, resize and encode behind a backend trait |
//! | [`error`] | Per-image error type shared by the picture pipeline |
//! | [`output`] | CLI output formatting for progress and summaries |
//!
//! # Design Decisions
//!
//! ## Names Are the Cache Key
//!
//! There is no cache index file. The hash in a variant's name covers the
//! source bytes, so edits produce new names and stale files are simply never
//! referenced again. Cleaning the cache directory is always safe.
//!
//! ## One Decode per Image
//!
//! The source is decoded once and shared read-only by every width of every
//! format. Widths of one format are encoded in parallel on the rayon pool.
//!
//! ## Failures Stay Local
//!
//! A broken or missing image fails only its own `<img>`, which is left in the
//! document untouched. The rest of the document, and the rest of the site,
//! still build.

pub mod cache;
pub mod config;
pub mod error;
pub mod generate;
pub mod imaging;
pub mod markdown;
pub mod naming;
pub mod output;
pub mod picture;
pub mod process;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_helpers;
