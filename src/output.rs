//! CLI output formatting for builds and single-picture runs.
//!
//! # Information-First Display
//!
//! Each document is a header line with its image count; each image leads
//! with its positional index and `src`, followed by one indented line per
//! produced file showing how it got to the output directory.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! posts/trip.md (2 images)
//!     001 photos/dawn.jpg
//!         webp 640w: cached
//!         webp 1280w: encoded
//!         fallback jpeg 360w: cached
//!     002 photos/broken.jpg
//!         failed (read error): failed to read photos/broken.jpg
//!
//! Built 1 page, 1 picture (1 failed), 0 assets copied
//! Cache: 2 cached, 1 encoded (3 total)
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::cache::VariantStatus;
use crate::config::ConfigWarning;
use crate::generate::BuildSummary;
use crate::process::ProcessEvent;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}s", count, word)
    }
}

fn status_str(status: VariantStatus) -> &'static str {
    match status {
        VariantStatus::Cached => "cached",
        VariantStatus::Copied => "copied",
        VariantStatus::Encoded => "encoded",
    }
}

// ============================================================================
// Process output
// ============================================================================

/// Format a single process progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::DocumentStarted { path, image_count } => {
            vec![format!("{} ({})", path, plural(*image_count, "image"))]
        }
        ProcessEvent::ImageProcessed {
            index,
            src,
            variants,
        } => {
            let mut lines = vec![format!("{}{} {}", indent(1), format_index(*index), src)];
            for variant in variants {
                lines.push(format!(
                    "{}{}: {}",
                    indent(2),
                    variant.label,
                    status_str(variant.status)
                ));
            }
            lines
        }
        ProcessEvent::ImageFailed {
            index,
            src,
            kind,
            message,
        } => vec![
            format!("{}{} {}", indent(1), format_index(*index), src),
            format!("{}failed ({}): {}", indent(2), kind, message),
        ],
    }
}

// ============================================================================
// Build output
// ============================================================================

/// Format the closing lines of a build.
pub fn format_build_summary(summary: &BuildSummary) -> Vec<String> {
    let mut pictures = plural(summary.pictures, "picture");
    if summary.failed > 0 {
        pictures.push_str(&format!(" ({} failed)", summary.failed));
    }
    vec![
        String::new(),
        format!(
            "Built {}, {}, {} copied",
            plural(summary.pages.len(), "page"),
            pictures,
            plural(summary.assets_copied, "asset")
        ),
        format!("Cache: {}", summary.cache_stats),
    ]
}

/// Print build summary to stdout.
pub fn print_build_summary(summary: &BuildSummary) {
    for line in format_build_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Config output
// ============================================================================

/// Format config warnings, or a single all-clear line.
pub fn format_config_warnings(warnings: &[ConfigWarning]) -> Vec<String> {
    if warnings.is_empty() {
        return vec!["Config is valid".to_string()];
    }
    let mut lines = vec![format!("Config is valid ({})", plural(warnings.len(), "warning"))];
    for warning in warnings {
        lines.push(format!("{}{}", indent(1), warning));
    }
    lines
}

/// Print config warnings to stdout.
pub fn print_config_warnings(warnings: &[ConfigWarning]) {
    for line in format_config_warnings(warnings) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
