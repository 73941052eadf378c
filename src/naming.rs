//! Variant filenames and public URLs.
//!
//! Every generated file is named after its source and the parameters that
//! produced it:
//!
//! ```text
//! {base_name}.{hash}.{width}.{quality}.{format}
//! photo.jpg.Xk3_a9QmZ0.1280.70.webp
//! ```
//!
//! The name is a pure function of its inputs, so identical requests always
//! land on the same file. That is what makes the cache directory reusable
//! across builds.
//!
//! ## URL joining
//!
//! [`url_join`] glues a base URL, folder, and filename together and cleans
//! up the result:
//!
//! - runs of `/` collapse to one
//! - `scheme:/` is restored to `scheme://` (and `file:` to `file:///`)
//! - a `/` directly before `?`, `&` or `#` is dropped
//! - the first query separator becomes `?`, every later one `&`

use crate::imaging::VariantSpec;
use regex::Regex;
use std::sync::LazyLock;

static MULTI_SLASH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/+").unwrap());
static SCHEME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+):/").unwrap());
static FILE_SCHEME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^file:").unwrap());
static SLASH_BEFORE_QUERY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(\?|&|#[^!])").unwrap());

/// Filename of a generated variant.
pub fn variant_filename(base_name: &str, hash: &str, spec: &VariantSpec) -> String {
    format!(
        "{}.{}.{}.{}.{}",
        base_name,
        hash,
        spec.width,
        spec.quality.value(),
        spec.format.name()
    )
}

/// Join URL segments with `/` and normalize the result.
///
/// ```
/// # use picturize::naming::url_join;
/// assert_eq!(url_join(&["https://a.com/", "/b/", "c.png"]), "https://a.com/b/c.png");
/// assert_eq!(url_join(&["a", "b", "?x=1"]), "a/b?x=1");
/// ```
pub fn url_join(parts: &[&str]) -> String {
    let joined = parts.join("/");
    let collapsed = MULTI_SLASH.replace_all(&joined, "/");
    let with_scheme = SCHEME.replace(&collapsed, "${1}://");
    let with_file = FILE_SCHEME.replace(&with_scheme, "file:/");
    let query_attached = SLASH_BEFORE_QUERY.replace_all(&with_file, "${1}");
    query_attached.replace('?', "&").replacen('&', "?", 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{Format, Quality};

    fn spec(width: u32, quality: u32, format: Format) -> VariantSpec {
        VariantSpec {
            format,
            quality: Quality::new(quality),
            width,
        }
    }

    // =========================================================================
    // variant_filename
    // =========================================================================

    #[test]
    fn filename_pattern() {
        assert_eq!(
            variant_filename("photo.jpg", "abcdefghij", &spec(640, 70, Format::Webp)),
            "photo.jpg.abcdefghij.640.70.webp"
        );
    }

    #[test]
    fn filename_is_deterministic() {
        let s = spec(1280, 60, Format::Avif);
        assert_eq!(
            variant_filename("a.png", "h", &s),
            variant_filename("a.png", "h", &s)
        );
    }

    #[test]
    fn filename_varies_with_every_input() {
        let base = variant_filename("a.png", "h", &spec(640, 60, Format::Avif));
        assert_ne!(base, variant_filename("b.png", "h", &spec(640, 60, Format::Avif)));
        assert_ne!(base, variant_filename("a.png", "g", &spec(640, 60, Format::Avif)));
        assert_ne!(base, variant_filename("a.png", "h", &spec(641, 60, Format::Avif)));
        assert_ne!(base, variant_filename("a.png", "h", &spec(640, 61, Format::Avif)));
        assert_ne!(base, variant_filename("a.png", "h", &spec(640, 60, Format::Webp)));
    }

    // =========================================================================
    // url_join
    // =========================================================================

    #[test]
    fn join_collapses_slashes_and_keeps_scheme() {
        assert_eq!(
            url_join(&["https://a.com/", "/b/", "c.png"]),
            "https://a.com/b/c.png"
        );
    }

    #[test]
    fn join_root_base_url() {
        assert_eq!(
            url_join(&["/", "picturize", "x.jpg.h.640.70.webp"]),
            "/picturize/x.jpg.h.640.70.webp"
        );
    }

    #[test]
    fn join_relative_parts() {
        assert_eq!(url_join(&["blog", "images", "a.png"]), "blog/images/a.png");
    }

    #[test]
    fn join_attaches_query_string() {
        assert_eq!(url_join(&["a", "b", "?x=1"]), "a/b?x=1");
    }

    #[test]
    fn join_folds_extra_query_separators() {
        assert_eq!(url_join(&["a", "?x=1", "?y=2"]), "a?x=1&y=2");
    }

    #[test]
    fn join_attaches_fragment() {
        assert_eq!(url_join(&["http://h.io", "page", "#top"]), "http://h.io/page#top");
    }

    #[test]
    fn join_file_scheme() {
        assert_eq!(url_join(&["file:///tmp", "x.png"]), "file:///tmp/x.png");
    }
}
