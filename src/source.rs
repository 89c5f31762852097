//! Input enumeration.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{GridError, Result};

/// Path of a source raster image.
pub type ImageReference = PathBuf;

/// Order in which folder entries are handed to the compositor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SortOrder {
    /// Whatever order the filesystem lists entries in. Not stable across platforms.
    #[default]
    Listing,
    /// Lexicographic by file name.
    Name,
}

/// Lists the regular files in `folder`, following symlinks.
///
/// Every file is returned, image or not; undecodable files fail later when
/// the compositor opens them. Directories, dangling links and special files
/// are skipped.
pub fn collect_images(folder: &Path, order: SortOrder) -> Result<Vec<ImageReference>> {
    trace!(folder = %folder.display(), ?order, "collect_images");

    if !folder.is_dir() {
        return Err(GridError::DirectoryNotFound {
            path: folder.to_path_buf(),
        });
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        let path = folder.join(entry.file_name());
        if !path.is_file() {
            debug!(path = %path.display(), "Skipping non-file entry");
            continue;
        }
        paths.push(path);
    }

    if order == SortOrder::Name {
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    }

    debug!(count = paths.len(), folder = %folder.display(), "Collected image paths");
    Ok(paths)
}
