//! End-to-end runs through the public API with the real image backend.
//!
//! Sources are small synthetic JPEGs so encoding stays fast.

use picturize::cache::{VariantCache, VariantStatus};
use picturize::config::Config;
use picturize::imaging::{Format, RustBackend};
use picturize::markdown;
use picturize::picture::build_picture;
use picturize::process::process_tree;
use picturize::{generate, tree};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    });
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
        .unwrap();
    bytes
}

fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, bytes).unwrap();
    path
}

fn config(root: &Path) -> Config {
    Config {
        folder_name: "img".into(),
        formats: vec![Format::Webp, Format::Jpeg],
        qualities: vec![80, 70],
        widths: vec![100, 200, 400],
        out_dir: root.join("dist").to_string_lossy().into_owned(),
        cache_dir: root.join("cache").to_string_lossy().into_owned(),
        base_url: "/static/".into(),
        ..Config::default()
    }
}

fn cache(config: &Config, use_cache: bool) -> VariantCache {
    let cache = VariantCache::for_config(config, use_cache);
    cache.ensure_dirs().unwrap();
    cache
}

fn out_file(config: &Config, name: &str) -> PathBuf {
    Path::new(&config.out_dir).join("img").join(name)
}

// =========================================================================
// Single picture
// =========================================================================

#[test]
fn builds_all_variants_from_a_real_jpeg() {
    let tmp = TempDir::new().unwrap();
    let config = config(tmp.path());
    let cache = cache(&config, true);
    let source = write(tmp.path(), "content/cat.jpg", &jpeg_bytes(300, 150));

    let built = build_picture(&RustBackend::new(), &config, &cache, &source, Some("A cat")).unwrap();

    let picture = &built.picture;
    assert_eq!(picture.sources.len(), 2);
    assert_eq!(picture.sources[0].mime_type, "image/webp");
    assert_eq!(picture.sources[1].mime_type, "image/jpeg");

    // 400 is clipped to the native 300
    let candidates: Vec<&str> = picture.sources[0].srcset.split(", ").collect();
    assert_eq!(candidates.len(), 3);
    assert!(candidates[0].starts_with("/static/img/cat.jpg."));
    assert!(candidates[0].ends_with(".100.80.webp 100w"));
    assert!(candidates[2].ends_with(".300.80.webp 300w"));

    assert_eq!(picture.fallback.alt, "A cat");
    assert_eq!((picture.fallback.width, picture.fallback.height), (300, 150));
    assert!(picture.fallback.src.ends_with(".300.50.jpeg"));

    // 3 webp + 3 jpeg + fallback
    assert_eq!(built.variants.len(), 7);
    assert!(built.variants.iter().all(|v| v.status == VariantStatus::Encoded));
}

#[test]
fn generated_files_have_scaled_dimensions() {
    let tmp = TempDir::new().unwrap();
    let config = config(tmp.path());
    let cache = cache(&config, true);
    let source = write(tmp.path(), "content/cat.jpg", &jpeg_bytes(300, 150));

    let built = build_picture(&RustBackend::new(), &config, &cache, &source, None).unwrap();

    let first = built.picture.sources[0].srcset.split(' ').next().unwrap();
    let name = first.rsplit('/').next().unwrap();
    let (w, h) = image::image_dimensions(out_file(&config, name)).unwrap();
    assert_eq!((w, h), (100, 50));

    let cached = Path::new(&config.cache_dir).join("img").join(name);
    assert!(cached.exists());
}

#[test]
fn second_build_is_served_from_cache() {
    let tmp = TempDir::new().unwrap();
    let config = config(tmp.path());
    let cache = cache(&config, true);
    let source = write(tmp.path(), "content/cat.jpg", &jpeg_bytes(300, 150));
    let backend = RustBackend::new();

    let first = build_picture(&backend, &config, &cache, &source, None).unwrap();
    std::fs::remove_dir_all(&config.out_dir).unwrap();
    cache.ensure_dirs().unwrap();
    let second = build_picture(&backend, &config, &cache, &source, None).unwrap();

    assert_eq!(first.picture, second.picture);
    assert!(second.variants.iter().all(|v| v.status == VariantStatus::Cached));
    assert!(out_file(&config, first.picture.fallback.src.rsplit('/').next().unwrap()).exists());
}

#[test]
fn changed_source_bytes_change_every_name() {
    let tmp = TempDir::new().unwrap();
    let config = config(tmp.path());
    let cache = cache(&config, true);
    let backend = RustBackend::new();
    let source = write(tmp.path(), "content/cat.jpg", &jpeg_bytes(300, 150));
    let before = build_picture(&backend, &config, &cache, &source, None).unwrap();

    write(tmp.path(), "content/cat.jpg", &jpeg_bytes(300, 160));
    let after = build_picture(&backend, &config, &cache, &source, None).unwrap();

    assert_ne!(before.picture.sources[0].srcset, after.picture.sources[0].srcset);
    assert_eq!(after.picture.fallback.height, 160);
    assert!(after.variants.iter().all(|v| v.status == VariantStatus::Encoded));
}

#[test]
fn original_image_is_copied_into_its_own_format() {
    let tmp = TempDir::new().unwrap();
    let config = Config {
        include_original_image: true,
        ..config(tmp.path())
    };
    let cache = cache(&config, true);
    let source = write(tmp.path(), "content/cat.jpg", &jpeg_bytes(300, 150));

    let built = build_picture(&RustBackend::new(), &config, &cache, &source, None).unwrap();

    let jpeg = &built.picture.sources[1].srcset;
    assert!(jpeg.ends_with("/static/img/cat.jpg 300w"));
    assert!(!jpeg.contains(".300.70.jpeg"));
    assert!(out_file(&config, "cat.jpg").exists());
    assert!(
        built
            .variants
            .iter()
            .any(|v| v.label == "jpeg original" && v.status == VariantStatus::Copied)
    );
}

#[test]
fn unreadable_source_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let config = config(tmp.path());
    let cache = cache(&config, true);
    let source = write(tmp.path(), "content/broken.jpg", b"not an image");

    let err = build_picture(&RustBackend::new(), &config, &cache, &source, None).unwrap_err();
    assert_eq!(err.kind(), "invalid metadata");
}

// =========================================================================
// Document trees
// =========================================================================

#[test]
fn process_tree_replaces_images_and_isolates_failures() {
    let tmp = TempDir::new().unwrap();
    let config = config(tmp.path());
    let cache = cache(&config, true);
    write(tmp.path(), "content/cat.jpg", &jpeg_bytes(300, 150));
    write(tmp.path(), "content/logo.svg", b"<svg/>");
    let doc = tmp.path().join("content/index.md");

    let mut parsed =
        markdown::parse("# Cats\n\n![](cat.jpg)\n\n![Logo](logo.svg)\n\n![Gone](gone.jpg)\n");
    let report = process_tree(
        &RustBackend::new(),
        &config,
        &cache,
        &mut parsed.root,
        &doc,
        &mut parsed.image_paths,
        None,
    )
    .unwrap();

    assert_eq!(report.matched, 2);
    assert_eq!(report.replaced, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].src, "gone.jpg");
    assert_eq!(report.failures[0].error.kind(), "read error");
    assert_eq!(report.cache_stats.misses, 7);

    let remaining: Vec<&str> = parsed.image_paths.iter().map(String::as_str).collect();
    assert_eq!(remaining, vec!["gone.jpg", "logo.svg"]);

    let html = parsed.root.to_html();
    assert!(html.contains("<picture>"));
    assert!(html.contains(r#"type="image/webp""#));
    assert!(html.contains(r#"alt="This is da image!""#));
    assert!(html.contains(r#"src="logo.svg""#));
    assert!(html.contains(r#"src="gone.jpg""#));
}

#[test]
fn tree_without_images_is_untouched() {
    let tmp = TempDir::new().unwrap();
    let config = config(tmp.path());
    let cache = cache(&config, true);
    let mut root = tree::Root::new(vec![tree::Node::text("plain")]);
    let before = root.clone();

    let report = process_tree(
        &RustBackend::new(),
        &config,
        &cache,
        &mut root,
        &tmp.path().join("doc.md"),
        &mut Default::default(),
        None,
    )
    .unwrap();

    assert_eq!(report.matched, 0);
    assert_eq!(root, before);
}

// =========================================================================
// Site build
// =========================================================================

#[test]
fn build_site_writes_pages_and_copies_leftovers() {
    let tmp = TempDir::new().unwrap();
    let config = config(tmp.path());
    let content = tmp.path().join("content");
    write(&content, "blog/cat.jpg", &jpeg_bytes(300, 150));
    write(&content, "blog/diagram.svg", b"<svg/>");
    write(
        &content,
        "blog/post.md",
        "# Post\n\n![A cat](cat.jpg)\n\n![](diagram.svg)\n".as_bytes(),
    );

    let summary = generate::build_site(&content, &config, true, None).unwrap();

    assert_eq!(summary.pages, vec![PathBuf::from("blog/post.html")]);
    assert_eq!(summary.pictures, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.assets_copied, 1);

    let out = Path::new(&config.out_dir);
    let page = std::fs::read_to_string(out.join("blog/post.html")).unwrap();
    assert!(page.contains("<title>Post</title>"));
    assert!(page.contains("<picture>"));
    assert!(out.join("blog/diagram.svg").exists());
}
