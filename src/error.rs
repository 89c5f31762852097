use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("Image folder not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("Failed to decode image {}", path.display())]
    ImageDecodeFailed {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Invalid layout dimensions: {reason}")]
    InvalidLayoutDimensions { reason: String },

    #[error("Failed to encode page {page}: {reason}")]
    PageEncodeFailed { page: usize, reason: String },

    #[error("No pages to export (a document needs at least one page)")]
    EmptyDocument,

    #[error("Failed to write document {}: {reason}", path.display())]
    DocumentWriteFailed { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GridError>;

impl GridError {
    pub(crate) fn layout(reason: impl Into<String>) -> Self {
        Self::InvalidLayoutDimensions {
            reason: reason.into(),
        }
    }
}
