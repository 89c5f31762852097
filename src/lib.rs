//! Image Grid - lay a folder of images out on a two-column grid and export
//! the pages as a single PDF.
//!
//! The pipeline is linear:
//! 1. [`source::collect_images`] lists the input folder
//! 2. [`compositor::Compositor::build_pages`] stretches every image into its slot
//! 3. [`export::PdfExporter::write`] serializes the pages into one document
//!
//! Any failure aborts the run before the output file is created.

pub mod compositor;
pub mod error;
pub mod export;
pub mod layout;
pub mod source;

pub use compositor::{Compositor, Page, ResizeFilter, build_pages};
pub use error::{GridError, Result};
pub use export::{ExportOptions, ImageEncoding, PdfExporter, export_pdf};
pub use layout::{GRID_COLUMNS, LayoutConfig, Slot};
pub use source::{ImageReference, SortOrder, collect_images};
