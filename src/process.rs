//! Batch driver: rewrite every eligible `<img>` in a document tree.
//!
//! Runs in two passes over an owned [`Root`]:
//!
//! 1. **Collect** (read-only): walk the tree in document order and record the
//!    index path, `src`, and `alt` of every eligible `img` element.
//! 2. **Replace**: build a [`Picture`](crate::picture::Picture) for each match
//!    and swap it in at the recorded path.
//!
//! Replacing a node with a single node never shifts the paths of other
//! matches, so the recorded paths stay valid through the second pass.
//!
//! ## Eligibility
//!
//! A `src` is skipped when it is site-root absolute (`/logo.png`) or a vector
//! image (`.svg`, any case). Those are left for the caller to handle.
//!
//! ## Failure isolation
//!
//! Each image is its own unit of work. A failure is logged, reported as a
//! [`ProcessEvent::ImageFailed`], and the original `img` stays in the tree
//! and in the caller's tracked set. Remaining images are still processed.

use crate::cache::{CacheStats, VariantCache};
use crate::config::Config;
use crate::error::PictureError;
use crate::imaging::ImageBackend;
use crate::picture::{VariantInfo, build_picture};
use crate::tree::{Node, Root};
use percent_encoding::percent_decode_str;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

/// Progress events sent while a document is processed.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    DocumentStarted {
        path: String,
        image_count: usize,
    },
    ImageProcessed {
        /// 1-based position among the document's eligible images.
        index: usize,
        src: String,
        variants: Vec<VariantInfo>,
    },
    ImageFailed {
        index: usize,
        src: String,
        kind: &'static str,
        message: String,
    },
}

/// An eligible `img` found in the collect pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMatch {
    pub path: Vec<usize>,
    pub src: String,
    pub alt: Option<String>,
}

#[derive(Debug)]
pub struct ImageFailure {
    pub src: String,
    pub error: PictureError,
}

/// Outcome of one [`process_tree`] call.
#[derive(Debug, Default)]
pub struct ProcessReport {
    pub matched: usize,
    pub replaced: usize,
    pub failures: Vec<ImageFailure>,
    pub cache_stats: CacheStats,
}

/// Whether the batch driver handles `src` at all.
pub fn is_eligible(src: &str) -> bool {
    !src.starts_with('/') && !src.to_ascii_lowercase().ends_with(".svg")
}

/// Every eligible `img` element, in document order.
pub fn collect_image_matches(root: &Root) -> Vec<ImageMatch> {
    let mut matches = Vec::new();
    let mut path = Vec::new();
    collect(&root.children, &mut path, &mut matches);
    matches
}

fn collect(nodes: &[Node], path: &mut Vec<usize>, out: &mut Vec<ImageMatch>) {
    for (index, node) in nodes.iter().enumerate() {
        let Node::Element(el) = node else {
            continue;
        };
        path.push(index);
        if el.tag == "img" {
            if let Some(src) = el.attr("src").filter(|src| is_eligible(src)) {
                out.push(ImageMatch {
                    path: path.clone(),
                    src: src.to_string(),
                    alt: el.attr("alt").map(str::to_string),
                });
            }
        } else {
            collect(&el.children, path, out);
        }
        path.pop();
    }
}

/// Filesystem path of `src` relative to the document at `document_path`.
pub fn resolve_source(document_path: &Path, src: &str) -> Result<PathBuf, PictureError> {
    let dir = document_path.parent().unwrap_or(Path::new(""));
    let decoded = percent_decode_str(src)
        .decode_utf8()
        .map_err(|e| PictureError::Read {
            path: dir.join(src),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
    Ok(dir.join(&*decoded))
}

/// Replace every eligible `img` in `tree` with a responsive `<picture>`.
///
/// `image_paths` is the caller's tracked set of raw `src` values; each
/// successfully replaced `src` is removed from it. Returns only after every
/// match was attempted.
pub fn process_tree(
    backend: &impl ImageBackend,
    config: &Config,
    cache: &VariantCache,
    tree: &mut Root,
    document_path: &Path,
    image_paths: &mut BTreeSet<String>,
    events: Option<&Sender<ProcessEvent>>,
) -> Result<ProcessReport, PictureError> {
    cache.ensure_dirs()?;

    let matches = collect_image_matches(tree);
    let mut report = ProcessReport {
        matched: matches.len(),
        ..ProcessReport::default()
    };

    if let Some(tx) = events {
        tx.send(ProcessEvent::DocumentStarted {
            path: document_path.display().to_string(),
            image_count: matches.len(),
        })
        .ok();
    }

    for (i, m) in matches.into_iter().enumerate() {
        let index = i + 1;
        let built = resolve_source(document_path, &m.src).and_then(|source| {
            build_picture(backend, config, cache, &source, m.alt.as_deref())
        });

        match built {
            Ok(built) => {
                tree.replace(&m.path, built.picture.to_element().into());
                image_paths.remove(&m.src);
                report.replaced += 1;
                for variant in &built.variants {
                    report.cache_stats.record(variant.status);
                }
                tracing::debug!(src = %m.src, variants = built.variants.len(), "picture built");
                if let Some(tx) = events {
                    tx.send(ProcessEvent::ImageProcessed {
                        index,
                        src: m.src,
                        variants: built.variants,
                    })
                    .ok();
                }
            }
            Err(error) => {
                tracing::error!(
                    src = %m.src,
                    document = %document_path.display(),
                    %error,
                    "failed to build picture"
                );
                if let Some(tx) = events {
                    tx.send(ProcessEvent::ImageFailed {
                        index,
                        src: m.src.clone(),
                        kind: error.kind(),
                        message: error.to_string(),
                    })
                    .ok();
                }
                report.failures.push(ImageFailure { src: m.src, error });
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Format;
    use crate::imaging::backend::tests::MockBackend;
    use crate::markdown;
    use crate::test_helpers::{test_cache, test_config, write_source};
    use crate::tree::Element;
    use tempfile::TempDir;

    fn tag_at(root: &Root, path: &[usize]) -> String {
        root.node_at(path)
            .and_then(Node::as_element)
            .map(|el| el.tag.clone())
            .unwrap_or_default()
    }

    // =========================================================================
    // Eligibility and collection
    // =========================================================================

    #[test]
    fn eligibility() {
        assert!(is_eligible("photo.jpg"));
        assert!(is_eligible("../shared/photo.png"));
        assert!(!is_eligible("/public/logo.png"));
        assert!(!is_eligible("diagram.svg"));
        assert!(!is_eligible("DIAGRAM.SVG"));
    }

    #[test]
    fn collects_in_document_order_with_paths() {
        let doc = markdown::parse(
            "![one](a.jpg)\n\n> quote ![two](b.png \"t\")\n\n![abs](/c.jpg) ![vec](d.svg)\n",
        );
        let matches = collect_image_matches(&doc.root);
        assert_eq!(
            matches,
            vec![
                ImageMatch {
                    path: vec![1],
                    src: "a.jpg".into(),
                    alt: Some("one".into()),
                },
                ImageMatch {
                    path: vec![3],
                    src: "b.png".into(),
                    alt: Some("two".into()),
                },
            ]
        );
    }

    #[test]
    fn collect_ignores_img_without_src() {
        let root = Root::new(vec![Element::new("img").with_attr("alt", "x").into()]);
        assert!(collect_image_matches(&root).is_empty());
    }

    #[test]
    fn resolve_source_is_relative_to_document_and_decoded() {
        let path = resolve_source(Path::new("content/blog/post.md"), "pics/my%20cat.jpg").unwrap();
        assert_eq!(path, Path::new("content/blog/pics/my cat.jpg"));
    }

    #[test]
    fn resolve_source_invalid_utf8_is_read_error() {
        let result = resolve_source(Path::new("post.md"), "bad%FF.jpg");
        assert!(matches!(result, Err(PictureError::Read { .. })));
    }

    // =========================================================================
    // process_tree
    // =========================================================================

    #[test]
    fn replaces_eligible_images_and_updates_tracked_set() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let cache = test_cache(&config);
        write_source(tmp.path(), "docs/a.jpg", b"a");
        let doc_path = tmp.path().join("docs/post.md");
        let mut doc = markdown::parse("![A](a.jpg)\n\n![Logo](/logo.png)\n");
        let backend = MockBackend::with_image(2000, 1000, Format::Jpeg);

        let report = process_tree(
            &backend,
            &config,
            &cache,
            &mut doc.root,
            &doc_path,
            &mut doc.image_paths,
            None,
        )
        .unwrap();

        assert_eq!(report.matched, 1);
        assert_eq!(report.replaced, 1);
        assert!(report.failures.is_empty());
        assert_eq!(report.cache_stats.misses, 4);
        assert_eq!(tag_at(&doc.root, &[1]), "picture");
        assert_eq!(tag_at(&doc.root, &[3]), "img");
        assert_eq!(
            doc.image_paths.into_iter().collect::<Vec<_>>(),
            vec!["/logo.png".to_string()]
        );
    }

    #[test]
    fn replaced_picture_carries_alt_text() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let cache = test_cache(&config);
        write_source(tmp.path(), "a.jpg", b"a");
        let mut doc = markdown::parse("![A red barn](a.jpg)");
        let backend = MockBackend::with_image(800, 600, Format::Jpeg);

        process_tree(
            &backend,
            &config,
            &cache,
            &mut doc.root,
            &tmp.path().join("index.md"),
            &mut doc.image_paths,
            None,
        )
        .unwrap();

        let html = doc.root.to_html();
        assert!(html.starts_with("<p><picture><source srcset=\"/img/a.jpg."));
        assert!(html.contains("alt=\"A red barn\""));
    }

    #[test]
    fn failure_leaves_node_and_continues() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let cache = test_cache(&config);
        write_source(tmp.path(), "present.jpg", b"p");
        let mut doc = markdown::parse("![gone](missing.jpg)\n\n![here](present.jpg)\n");
        let original = doc.root.node_at(&[1]).cloned();
        let backend = MockBackend::with_image(800, 600, Format::Jpeg);

        let report = process_tree(
            &backend,
            &config,
            &cache,
            &mut doc.root,
            &tmp.path().join("index.md"),
            &mut doc.image_paths,
            None,
        )
        .unwrap();

        assert_eq!(report.replaced, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].src, "missing.jpg");
        assert!(matches!(
            report.failures[0].error,
            PictureError::Read { .. }
        ));
        assert_eq!(doc.root.node_at(&[1]).cloned(), original);
        assert_eq!(tag_at(&doc.root, &[3]), "picture");
        assert!(doc.image_paths.contains("missing.jpg"));
        assert!(!doc.image_paths.contains("present.jpg"));
    }

    #[test]
    fn percent_encoded_src_resolves_to_file() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let cache = test_cache(&config);
        write_source(tmp.path(), "my photo.jpg", b"m");
        let mut doc = markdown::parse("![x](my%20photo.jpg)");
        let backend = MockBackend::with_image(800, 600, Format::Jpeg);

        let report = process_tree(
            &backend,
            &config,
            &cache,
            &mut doc.root,
            &tmp.path().join("index.md"),
            &mut doc.image_paths,
            None,
        )
        .unwrap();

        assert_eq!(report.replaced, 1);
        assert!(doc.image_paths.is_empty());
    }

    #[test]
    fn creates_cache_and_output_dirs() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let cache = VariantCache::for_config(&config, true);
        let mut root = Root::default();
        let mut tracked = BTreeSet::new();

        process_tree(
            &MockBackend::new(),
            &config,
            &cache,
            &mut root,
            &tmp.path().join("index.md"),
            &mut tracked,
            None,
        )
        .unwrap();

        assert!(cache.out_dir().is_dir());
        assert!(cache.cache_dir().is_dir());
    }

    #[test]
    fn sends_progress_events() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let cache = test_cache(&config);
        write_source(tmp.path(), "ok.jpg", b"o");
        let mut doc = markdown::parse("![](ok.jpg) ![](nope.jpg)");
        let backend = MockBackend::with_image(800, 600, Format::Jpeg);
        let (tx, rx) = std::sync::mpsc::channel();

        process_tree(
            &backend,
            &config,
            &cache,
            &mut doc.root,
            &tmp.path().join("index.md"),
            &mut doc.image_paths,
            Some(&tx),
        )
        .unwrap();
        drop(tx);

        let events: Vec<ProcessEvent> = rx.into_iter().collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[0],
            ProcessEvent::DocumentStarted { image_count: 2, .. }
        ));
        assert!(matches!(
            &events[1],
            ProcessEvent::ImageProcessed { index: 1, src, .. } if src == "ok.jpg"
        ));
        assert!(matches!(
            &events[2],
            ProcessEvent::ImageFailed { index: 2, kind: "read error", .. }
        ));
    }
}
