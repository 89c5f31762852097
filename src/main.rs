use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use image_grid::export::{DEFAULT_DPI, DEFAULT_JPEG_QUALITY};
use image_grid::layout::{
    DEFAULT_IMAGES_PER_PAGE, DEFAULT_MARGIN_SIZE, DEFAULT_PAGE_HEIGHT, DEFAULT_PAGE_WIDTH,
};
use image_grid::{
    Compositor, ExportOptions, ImageEncoding, LayoutConfig, PdfExporter, ResizeFilter, SortOrder,
    collect_images,
};

// Margin mode when --margin is not given
const DEFAULT_USE_MARGIN: bool = false;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Encoding {
    Jpeg,
    Flate,
}

/// Create a PDF from a folder of images
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Folder containing images
    folder: PathBuf,

    /// Output PDF file
    #[arg(short, long, default_value = "output.pdf")]
    output: PathBuf,

    /// Add margin between images and around the page edge
    #[arg(short, long, default_value_t = DEFAULT_USE_MARGIN)]
    margin: bool,

    /// Images per page (two per row)
    #[arg(long = "images_per_page", alias = "images-per-page", default_value_t = DEFAULT_IMAGES_PER_PAGE)]
    images_per_page: usize,

    /// Page width in pixels
    #[arg(long = "page_width", alias = "page-width", default_value_t = DEFAULT_PAGE_WIDTH)]
    page_width: u32,

    /// Page height in pixels
    #[arg(long = "page_height", alias = "page-height", default_value_t = DEFAULT_PAGE_HEIGHT)]
    page_height: u32,

    /// Margin width in pixels (only with --margin)
    #[arg(long = "margin_size", alias = "margin-size", default_value_t = DEFAULT_MARGIN_SIZE)]
    margin_size: u32,

    /// Order images are placed in; `listing` keeps the filesystem order
    #[arg(long, value_enum, default_value_t = SortOrder::Listing)]
    sort: SortOrder,

    /// Resampling filter used when stretching images into slots
    #[arg(long, value_enum, default_value_t = ResizeFilter::CatmullRom)]
    filter: ResizeFilter,

    /// Pixels per inch, sets the physical page size in the PDF
    #[arg(long, default_value_t = DEFAULT_DPI)]
    dpi: f32,

    /// How page images are stored in the PDF
    #[arg(long, value_enum, default_value_t = Encoding::Jpeg)]
    encoding: Encoding,

    /// JPEG quality (1-100)
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Verbose logging (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn layout(&self) -> LayoutConfig {
        let layout = LayoutConfig::new(self.page_width, self.page_height, self.images_per_page);
        if self.margin {
            layout.with_margin(self.margin_size)
        } else {
            layout
        }
    }

    fn export_options(&self) -> ExportOptions {
        let encoding = match self.encoding {
            Encoding::Jpeg => ImageEncoding::Jpeg {
                quality: self.quality,
            },
            Encoding::Flate => ImageEncoding::Flate,
        };
        ExportOptions {
            dpi: self.dpi,
            encoding,
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    debug!(?args, "Parsed arguments");

    let layout = args.layout();
    layout.validate().context("Invalid page layout")?;

    let image_paths = collect_images(&args.folder, args.sort)
        .with_context(|| format!("Cannot read images from {}", args.folder.display()))?;
    println!("Found {} images", image_paths.len());

    let pages = Compositor::new(layout)
        .with_filter(args.filter)
        .build_pages(&image_paths)
        .context("Failed to lay out pages")?;

    PdfExporter::new(args.export_options())
        .write(&pages, &args.output)
        .context("Failed to export PDF")?;

    println!("PDF saved to {}", args.output.display());
    Ok(())
}
