//! Site build: markdown documents in, HTML pages with responsive pictures out.
//!
//! For every `.md` file under the source root (hidden entries skipped,
//! sorted by name):
//!
//! 1. Parse it into a document tree, tracking its image references.
//! 2. Run the batch driver, replacing eligible images with `<picture>`.
//! 3. Render a full page and write it to `{out_dir}/{relative}.html`.
//! 4. Copy image references the driver did not replace (SVGs, failures)
//!    verbatim next to the page, so their links keep working.
//!
//! Root-absolute references (`/logo.png`) are never copied: they point into
//! the public root, which the host serves on its own.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html
//! ├── blog/
//! │   ├── post.html
//! │   └── diagram.svg              # unreplaced reference, copied
//! └── picturize/                   # variants, named {base}.{hash}.{w}.{q}.{fmt}
//!     ├── cat.jpg.Xk3_a9QmZ0.640.60.avif
//!     └── ...
//! ```
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! The stylesheet `static/style.css` is embedded at compile time.

use crate::cache::{CacheStats, VariantCache};
use crate::config::Config;
use crate::error::PictureError;
use crate::imaging::{ImageBackend, RustBackend};
use crate::markdown;
use crate::process::{ProcessEvent, process_tree, resolve_source};
use crate::tree::Root;
use maud::{DOCTYPE, Markup, html};
use percent_encoding::percent_decode_str;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Picture(#[from] PictureError),
}

/// Totals for a whole build.
#[derive(Debug, Default)]
pub struct BuildSummary {
    /// Written pages, relative to the output directory.
    pub pages: Vec<PathBuf>,
    pub pictures: usize,
    pub failed: usize,
    pub assets_copied: usize,
    pub cache_stats: CacheStats,
}

const CSS: &str = include_str!("../static/style.css");

pub fn build_site(
    source_root: &Path,
    config: &Config,
    use_cache: bool,
    events: Option<Sender<ProcessEvent>>,
) -> Result<BuildSummary, GenerateError> {
    let backend = RustBackend::new();
    build_site_with_backend(&backend, source_root, config, use_cache, events)
}

/// Build the site using a specific backend (allows testing with mock).
pub fn build_site_with_backend(
    backend: &impl ImageBackend,
    source_root: &Path,
    config: &Config,
    use_cache: bool,
    events: Option<Sender<ProcessEvent>>,
) -> Result<BuildSummary, GenerateError> {
    let out_root = Path::new(&config.out_dir);
    let cache = VariantCache::for_config(config, use_cache);
    cache.ensure_dirs()?;

    let mut summary = BuildSummary::default();

    for rel in find_documents(source_root, out_root)? {
        let doc_path = source_root.join(&rel);
        let text = fs::read_to_string(&doc_path)?;
        let mut parsed = markdown::parse(&text);

        let report = process_tree(
            backend,
            config,
            &cache,
            &mut parsed.root,
            &doc_path,
            &mut parsed.image_paths,
            events.as_ref(),
        )?;
        summary.pictures += report.replaced;
        summary.failed += report.failures.len();
        summary.cache_stats.merge(&report.cache_stats);

        let title = parsed.title.take().unwrap_or_else(|| {
            rel.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        let page_rel = rel.with_extension("html");
        let page_path = out_root.join(&page_rel);
        if let Some(parent) = page_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&page_path, render_page(&title, &parsed.root).into_string())?;
        tracing::debug!(page = %page_rel.display(), "wrote page");

        let doc_dir = rel.parent().unwrap_or(Path::new(""));
        for src in &parsed.image_paths {
            if copy_leftover(&doc_path, doc_dir, out_root, src)? {
                summary.assets_copied += 1;
            }
        }

        summary.pages.push(page_rel);
    }

    Ok(summary)
}

/// Markdown files under `source_root`, relative to it, sorted by name.
///
/// Hidden entries and anything inside `out_root` are skipped. Both sides are
/// compared canonicalized, so `./dist` and `dist` are the same directory.
pub fn find_documents(source_root: &Path, out_root: &Path) -> Result<Vec<PathBuf>, GenerateError> {
    let mut documents = Vec::new();
    let out_canonical = fs::canonicalize(out_root).ok();
    let walker = WalkDir::new(source_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0 || (!is_hidden(e) && !is_inside(e.path(), out_canonical.as_deref()))
        });

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_markdown = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("md"));
        if !is_markdown {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(source_root) {
            documents.push(rel.to_path_buf());
        }
    }
    Ok(documents)
}

fn is_inside(path: &Path, dir: Option<&Path>) -> bool {
    let Some(dir) = dir else {
        return false;
    };
    fs::canonicalize(path).is_ok_and(|p| p.starts_with(dir))
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

/// Copy one unreplaced reference next to its page. Returns whether a file
/// was copied; references that are absolute, missing, or would land outside
/// the output directory are skipped.
fn copy_leftover(
    doc_path: &Path,
    doc_dir: &Path,
    out_root: &Path,
    src: &str,
) -> Result<bool, GenerateError> {
    if src.starts_with('/') {
        return Ok(false);
    }
    let Ok(from) = resolve_source(doc_path, src) else {
        return Ok(false);
    };
    if !from.is_file() {
        return Ok(false);
    }
    let Ok(decoded) = percent_decode_str(src).decode_utf8() else {
        return Ok(false);
    };
    let Some(rel) = normalize(&doc_dir.join(&*decoded)) else {
        tracing::warn!(src, "reference escapes the output directory, not copied");
        return Ok(false);
    };

    let to = out_root.join(rel);
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(&from, &to)?;
    tracing::debug!(src, "copied unreplaced reference");
    Ok(true)
}

/// Lexically resolve `.` and `..`. `None` if the path climbs above its start
/// or is absolute.
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(out)
}

fn base_document(title: &str, css: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (css) }
            }
            body {
                (content)
            }
        }
    }
}

/// A full HTML page around a rendered document tree.
pub fn render_page(title: &str, root: &Root) -> Markup {
    base_document(title, CSS, html! { main { (root) } })
}
