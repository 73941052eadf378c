//! Error kinds for building a responsive picture from one source image.
//!
//! Three kinds cover every failure on the variant path. Sizing and cache
//! failures surface unchanged through [`build_picture`](crate::picture::build_picture),
//! so the batch driver can match on the kind instead of inspecting messages.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PictureError {
    /// The source file is missing or could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes were read but width, height, or format could not be determined.
    #[error("Invalid image metadata for {path}: {message}")]
    InvalidMetadata { path: PathBuf, message: String },

    /// A variant could not be written to the output or cache directory.
    #[error("Failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },
}

impl PictureError {
    pub(crate) fn write(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Write {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub(crate) fn invalid_metadata(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Short lowercase label for progress output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Read { .. } => "read error",
            Self::InvalidMetadata { .. } => "invalid metadata",
            Self::Write { .. } => "write error",
        }
    }
}
