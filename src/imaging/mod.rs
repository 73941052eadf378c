//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` with format sniffing |
//! | **Resize** | Lanczos3 via `resize_exact` |
//! | **Encode** | AVIF (rav1e), JPEG, WebP (libwebp, lossy), PNG, TIFF |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for width selection and aspect math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, DecodedImage, ImageBackend, ImageMetadata};
pub use calculations::{compute_widths, scaled_height};
pub use params::{EncodeParams, Format, Quality, VariantSpec};
pub use rust_backend::RustBackend;
