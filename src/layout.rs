//! Grid geometry and pagination.
//!
//! Pages hold a fixed two-column grid. Row count follows from the number of
//! images per page, and every slot on a page has the same size.

use tracing::warn;

use crate::error::{GridError, Result};

// Letter size at 300 DPI, in pixels
pub const DEFAULT_PAGE_WIDTH: u32 = 2550;
pub const DEFAULT_PAGE_HEIGHT: u32 = 3300;

pub const DEFAULT_IMAGES_PER_PAGE: usize = 6;
pub const DEFAULT_MARGIN_SIZE: u32 = 30;

// The grid is always two slots wide
pub const GRID_COLUMNS: usize = 2;

/// Page geometry shared by every page of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConfig {
    pub page_width: u32,
    pub page_height: u32,
    pub images_per_page: usize,
    /// Gap in pixels between slots and around the page edge. `None` tiles the
    /// page edge to edge.
    pub margin: Option<u32>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width: DEFAULT_PAGE_WIDTH,
            page_height: DEFAULT_PAGE_HEIGHT,
            images_per_page: DEFAULT_IMAGES_PER_PAGE,
            margin: None,
        }
    }
}

/// A rectangle on a page reserved for one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub index: usize,
    pub row: usize,
    pub column: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl LayoutConfig {
    pub fn new(page_width: u32, page_height: u32, images_per_page: usize) -> Self {
        Self {
            page_width,
            page_height,
            images_per_page,
            margin: None,
        }
    }

    pub fn with_margin(mut self, size: u32) -> Self {
        self.margin = Some(size);
        self
    }

    pub fn without_margin(mut self) -> Self {
        self.margin = None;
        self
    }

    pub fn columns(&self) -> usize {
        GRID_COLUMNS
    }

    /// Odd counts leave the last slot below the final full row.
    pub fn rows(&self) -> usize {
        self.images_per_page / GRID_COLUMNS
    }

    /// Number of pages needed for `image_count` images. Zero images need zero pages.
    pub fn page_count(&self, image_count: usize) -> usize {
        if self.images_per_page == 0 {
            return 0;
        }
        image_count.div_ceil(self.images_per_page)
    }

    /// Page index and slot index for the image at `image_index` in input order.
    /// Expects a validated layout.
    pub fn placement(&self, image_index: usize) -> (usize, usize) {
        (
            image_index / self.images_per_page,
            image_index % self.images_per_page,
        )
    }

    /// Number of populated slots on `page` when laying out `image_count` images.
    pub fn images_on_page(&self, page: usize, image_count: usize) -> usize {
        let start = page.saturating_mul(self.images_per_page);
        image_count.saturating_sub(start).min(self.images_per_page)
    }

    /// Width and height every image is stretched to.
    pub fn slot_size(&self) -> Result<(u32, u32)> {
        if self.images_per_page == 0 {
            return Err(GridError::layout("images per page must be positive"));
        }
        let rows = self.rows();
        if rows == 0 {
            return Err(GridError::layout(format!(
                "{} images per page leaves no complete row in a {}-column grid",
                self.images_per_page, GRID_COLUMNS
            )));
        }
        let rows = u32::try_from(rows)
            .map_err(|_| GridError::layout(format!("{rows} rows do not fit on a page")))?;
        let columns = GRID_COLUMNS as u32;

        let (width, height) = match self.margin {
            None => (self.page_width / columns, self.page_height / rows),
            Some(margin) => {
                let width = shrink(self.page_width, margin, columns, "width")?;
                let height = shrink(self.page_height, margin, rows, "height")?;
                (width, height)
            }
        };

        if width == 0 || height == 0 {
            return Err(GridError::layout(format!(
                "slot size {width}x{height} on a {}x{} page",
                self.page_width, self.page_height
            )));
        }
        Ok((width, height))
    }

    /// Geometry of slot `index` on any page.
    pub fn slot(&self, index: usize) -> Result<Slot> {
        if index >= self.images_per_page {
            return Err(GridError::layout(format!(
                "slot {index} is outside a page of {} slots",
                self.images_per_page
            )));
        }
        let (width, height) = self.slot_size()?;
        let row = index / GRID_COLUMNS;
        let column = index % GRID_COLUMNS;

        let (x, y) = match self.margin {
            None => (column as u32 * width, row as u32 * height),
            Some(margin) => (
                margin + column as u32 * (width + margin),
                margin + row as u32 * (height + margin),
            ),
        };

        Ok(Slot {
            index,
            row,
            column,
            x,
            y,
            width,
            height,
        })
    }

    /// All slots of a page in fill order.
    pub fn slots(&self) -> Result<Vec<Slot>> {
        (0..self.images_per_page).map(|i| self.slot(i)).collect()
    }

    /// Fails the same way `slot_size` does. Run before any image is opened.
    pub fn validate(&self) -> Result<()> {
        self.slot_size()?;
        if self.images_per_page % GRID_COLUMNS != 0 {
            warn!(
                images_per_page = self.images_per_page,
                columns = GRID_COLUMNS,
                "Last slot of each page falls below the grid and will be clipped"
            );
        }
        Ok(())
    }
}

// Splits `extent` into `count` cells separated and bordered by `margin`
fn shrink(extent: u32, margin: u32, count: u32, axis: &str) -> Result<u32> {
    let gutters = margin
        .checked_mul(count + 1)
        .filter(|g| *g < extent)
        .ok_or_else(|| {
            GridError::layout(format!(
                "margin {margin} leaves no room for {count} slots across page {axis} {extent}"
            ))
        })?;
    Ok((extent - gutters) / count)
}
