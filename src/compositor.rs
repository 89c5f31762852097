//! Page compositor.
//!
//! Turns an ordered list of image paths into white page canvases with every
//! image stretched into its grid slot. Image `i` always lands on page
//! `i / images_per_page`, slot `i % images_per_page`; trailing slots of the
//! last page stay blank.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use tracing::{debug, info, trace};

use crate::error::{GridError, Result};
use crate::layout::{LayoutConfig, Slot};
use crate::source::ImageReference;

pub const PAGE_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Resampling filter used when stretching an image into its slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    #[default]
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// One sheet of the output document.
#[derive(Debug, Clone)]
pub struct Page {
    index: usize,
    canvas: RgbImage,
    slots: Vec<Slot>,
}

impl Page {
    /// White canvas of `width` x `height` pixels.
    pub fn new(index: usize, width: u32, height: u32) -> Self {
        Self {
            index,
            canvas: RgbImage::from_pixel(width, height, PAGE_BACKGROUND),
            slots: Vec::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    pub fn canvas(&self) -> &RgbImage {
        &self.canvas
    }

    /// Populated slots, in placement order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

pub struct Compositor {
    layout: LayoutConfig,
    filter: ResizeFilter,
}

impl Compositor {
    pub fn new(layout: LayoutConfig) -> Self {
        Self {
            layout,
            filter: ResizeFilter::default(),
        }
    }

    pub fn with_filter(mut self, filter: ResizeFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Builds every page for `paths`, in input order.
    ///
    /// The layout is checked before any file is opened. The first image that
    /// fails to decode aborts the whole run and no pages are returned.
    pub fn build_pages(&self, paths: &[ImageReference]) -> Result<Vec<Page>> {
        trace!(images = paths.len(), layout = ?self.layout, "build_pages");
        self.layout.validate()?;

        let total = paths.len();
        let mut pages = Vec::with_capacity(self.layout.page_count(total));
        let mut current: Option<Page> = None;

        for (image_index, path) in paths.iter().enumerate() {
            let (page_index, slot_index) = self.layout.placement(image_index);
            if current.as_ref().map(Page::index) != Some(page_index) {
                if let Some(done) = current.take() {
                    pages.push(self.finish_page(done, total));
                }
            }
            let page = current.get_or_insert_with(|| self.blank_page(page_index));

            let image = open_image(path)?;
            let slot = self.place(page, slot_index, &image)?;
            debug!(
                page = page_index,
                slot = slot_index,
                path = %path.display(),
                x = slot.x,
                y = slot.y,
                "Placed image"
            );
        }
        if let Some(done) = current.take() {
            pages.push(self.finish_page(done, total));
        }

        Ok(pages)
    }

    fn finish_page(&self, page: Page, total: usize) -> Page {
        debug_assert_eq!(
            page.slots().len(),
            self.layout.images_on_page(page.index(), total)
        );
        info!(
            page = page.index() + 1,
            filled = page.slots().len(),
            slots = self.layout.images_per_page,
            "Page composed"
        );
        page
    }

    /// Blank page sized to the layout.
    pub fn blank_page(&self, index: usize) -> Page {
        Page::new(index, self.layout.page_width, self.layout.page_height)
    }

    /// Stretches `image` to the slot size and pastes it over slot `slot_index`.
    ///
    /// Alpha is dropped. Pixels falling outside the canvas are clipped.
    pub fn place(&self, page: &mut Page, slot_index: usize, image: &DynamicImage) -> Result<Slot> {
        let slot = self.layout.slot(slot_index)?;
        let resized = image
            .resize_exact(slot.width, slot.height, self.filter.into())
            .to_rgb8();
        imageops::replace(&mut page.canvas, &resized, i64::from(slot.x), i64::from(slot.y));
        page.slots.push(slot);
        Ok(slot)
    }
}

/// Convenience wrapper over [`Compositor::build_pages`].
pub fn build_pages(paths: &[ImageReference], layout: &LayoutConfig) -> Result<Vec<Page>> {
    Compositor::new(*layout).build_pages(paths)
}

fn open_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|source| GridError::ImageDecodeFailed {
        path: path.to_path_buf(),
        source,
    })
}
