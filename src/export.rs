//! Multi-page PDF export.
//!
//! Every page becomes one PDF page showing its canvas as a single full-page
//! image XObject. The first page anchors the document and the rest follow in
//! order.

use std::fs;
use std::path::Path;

use image::ColorType;
use image::codecs::jpeg::JpegEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use tracing::{debug, info, trace};

use crate::compositor::Page;
use crate::error::{GridError, Result};

// PDF user space unit
const POINTS_PER_INCH: f32 = 72.0;

pub const DEFAULT_DPI: f32 = 72.0;
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

const PAGE_IMAGE_NAME: &str = "Im0";

/// How page canvases are stored inside the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    /// Lossy, `/DCTDecode`.
    Jpeg { quality: u8 },
    /// Lossless raw RGB, deflated by the document writer.
    Flate,
}

impl Default for ImageEncoding {
    fn default() -> Self {
        Self::Jpeg {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    /// Pixels per inch used to size each page's MediaBox.
    pub dpi: f32,
    pub encoding: ImageEncoding,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            encoding: ImageEncoding::default(),
        }
    }
}

impl ExportOptions {
    fn to_points(&self, pixels: u32) -> f32 {
        pixels as f32 * POINTS_PER_INCH / self.dpi
    }
}

#[derive(Debug, Default)]
pub struct PdfExporter {
    options: ExportOptions,
}

impl PdfExporter {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    /// Serializes `pages` to `path`. Nothing is created on disk unless the
    /// whole document renders.
    pub fn write(&self, pages: &[Page], path: &Path) -> Result<()> {
        trace!(pages = pages.len(), path = %path.display(), "PdfExporter::write");
        let mut doc = self.render(pages)?;

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).map_err(|e| write_failed(path, e))?;
        fs::write(path, &buffer).map_err(|e| write_failed(path, e))?;

        info!(
            pages = pages.len(),
            bytes = buffer.len(),
            path = %path.display(),
            "Document written"
        );
        Ok(())
    }

    /// Builds the in-memory document.
    pub fn render(&self, pages: &[Page]) -> Result<Document> {
        if pages.is_empty() {
            return Err(GridError::EmptyDocument);
        }
        if !(self.options.dpi.is_finite() && self.options.dpi > 0.0) {
            return Err(GridError::layout(format!(
                "dpi must be positive, got {}",
                self.options.dpi
            )));
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

        for page in pages {
            let width_pt = self.options.to_points(page.width());
            let height_pt = self.options.to_points(page.height());

            let image_id = doc.add_object(self.image_stream(page)?);

            // Scale the unit-square image to cover the MediaBox
            let content = Content {
                operations: vec![
                    Operation::new("q", vec![]),
                    Operation::new(
                        "cm",
                        vec![
                            width_pt.into(),
                            0.into(),
                            0.into(),
                            height_pt.into(),
                            0.into(),
                            0.into(),
                        ],
                    ),
                    Operation::new("Do", vec![Object::Name(PAGE_IMAGE_NAME.as_bytes().to_vec())]),
                    Operation::new("Q", vec![]),
                ],
            };
            let content_data = content.encode().map_err(|e| GridError::PageEncodeFailed {
                page: page.index(),
                reason: e.to_string(),
            })?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, content_data));

            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), width_pt.into(), height_pt.into()],
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "XObject" => dictionary! {
                        PAGE_IMAGE_NAME => image_id,
                    },
                },
            });
            debug!(
                page = page.index(),
                width_pt,
                height_pt,
                object = page_id.0,
                "Added page"
            );
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        if self.options.encoding == ImageEncoding::Flate {
            doc.compress();
        }

        Ok(doc)
    }

    fn image_stream(&self, page: &Page) -> Result<Stream> {
        let canvas = page.canvas();
        let (width, height) = canvas.dimensions();

        let mut image_dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        };

        let stream = match self.options.encoding {
            ImageEncoding::Jpeg { quality } => {
                let mut data = Vec::new();
                JpegEncoder::new_with_quality(&mut data, quality.clamp(1, 100))
                    .encode(canvas.as_raw(), width, height, ColorType::Rgb8)
                    .map_err(|e| GridError::PageEncodeFailed {
                        page: page.index(),
                        reason: e.to_string(),
                    })?;
                image_dict.set("Filter", "DCTDecode");
                let mut stream = Stream::new(image_dict, data);
                stream.allows_compression = false;
                stream
            }
            ImageEncoding::Flate => Stream::new(image_dict, canvas.as_raw().clone()),
        };
        Ok(stream)
    }
}

/// Writes `pages` with default options.
pub fn export_pdf(pages: &[Page], path: &Path) -> Result<()> {
    PdfExporter::default().write(pages, path)
}

fn write_failed(path: &Path, err: impl std::fmt::Display) -> GridError {
    GridError::DocumentWriteFailed {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::{Compositor, ResizeFilter};
    use crate::layout::LayoutConfig;
    use flate2::read::ZlibDecoder;
    use image::{DynamicImage, Rgb, RgbImage};
    use lopdf::ObjectId;
    use std::io::Read;
    use tempfile::TempDir;

    // Image XObjects are not decoded by lopdf itself
    fn inflate(stream: &Stream) -> Vec<u8> {
        let mut raw = Vec::new();
        ZlibDecoder::new(stream.content.as_slice())
            .read_to_end(&mut raw)
            .unwrap();
        raw
    }

    // Page `i` has its top-left slot filled with `colors[i]`
    fn painted_pages(colors: &[Rgb<u8>]) -> Vec<Page> {
        let compositor =
            Compositor::new(LayoutConfig::new(32, 48, 6)).with_filter(ResizeFilter::Nearest);
        colors
            .iter()
            .enumerate()
            .map(|(i, color)| {
                let mut page = compositor.blank_page(i);
                let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, *color));
                compositor.place(&mut page, 0, &image).unwrap();
                page
            })
            .collect()
    }

    fn pages(count: usize, width: u32, height: u32) -> Vec<Page> {
        (0..count).map(|i| Page::new(i, width, height)).collect()
    }

    fn number(obj: &Object) -> f64 {
        match obj {
            Object::Integer(v) => *v as f64,
            Object::Real(v) => *v as f64,
            other => panic!("not a number: {other:?}"),
        }
    }

    fn media_box(doc: &Document, page_id: ObjectId) -> Vec<f64> {
        doc.get_dictionary(page_id)
            .unwrap()
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(number)
            .collect()
    }

    fn page_image(doc: &Document, page_id: ObjectId) -> &Stream {
        let resources = doc
            .get_dictionary(page_id)
            .unwrap()
            .get(b"Resources")
            .unwrap()
            .as_dict()
            .unwrap();
        let image_ref = resources
            .get(b"XObject")
            .unwrap()
            .as_dict()
            .unwrap()
            .get(PAGE_IMAGE_NAME.as_bytes())
            .unwrap()
            .as_reference()
            .unwrap();
        doc.get_object(image_ref).unwrap().as_stream().unwrap()
    }

    #[test]
    fn test_empty_page_list_fails() {
        let err = PdfExporter::default().render(&[]).unwrap_err();
        assert!(matches!(err, GridError::EmptyDocument));
    }

    #[test]
    fn test_empty_export_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.pdf");
        assert!(export_pdf(&[], &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_pages_in_order_with_media_box() {
        let doc = PdfExporter::default().render(&pages(3, 60, 90)).unwrap();
        let page_ids = doc.get_pages();
        assert_eq!(page_ids.len(), 3);

        for page_id in page_ids.values() {
            assert_eq!(media_box(&doc, *page_id), vec![0.0, 0.0, 60.0, 90.0]);
            let image = page_image(&doc, *page_id);
            assert_eq!(image.dict.get(b"Width").unwrap().as_i64().unwrap(), 60);
            assert_eq!(image.dict.get(b"Height").unwrap().as_i64().unwrap(), 90);
            assert_eq!(image.dict.get(b"Filter").unwrap().as_name().unwrap(), b"DCTDecode");
        }
    }

    #[test]
    fn test_dpi_scales_media_box() {
        let exporter = PdfExporter::new(ExportOptions {
            dpi: 300.0,
            ..Default::default()
        });
        let doc = exporter.render(&pages(1, 2550, 3300)).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        // US Letter
        assert_eq!(media_box(&doc, page_id), vec![0.0, 0.0, 612.0, 792.0]);
    }

    #[test]
    fn test_invalid_dpi() {
        let exporter = PdfExporter::new(ExportOptions {
            dpi: 0.0,
            ..Default::default()
        });
        assert!(matches!(
            exporter.render(&pages(1, 10, 10)),
            Err(GridError::InvalidLayoutDimensions { .. })
        ));
    }

    #[test]
    fn test_flate_round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flate.pdf");
        let exporter = PdfExporter::new(ExportOptions {
            encoding: ImageEncoding::Flate,
            ..Default::default()
        });
        exporter.write(&pages(2, 32, 48), &path).unwrap();

        let doc = Document::load(&path).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
        let page_id = *doc.get_pages().get(&2).unwrap();
        let image = page_image(&doc, page_id);
        assert_eq!(
            image.dict.get(b"Filter").unwrap().as_name().unwrap(),
            b"FlateDecode"
        );
        let raw = inflate(image);
        assert_eq!(raw.len(), 32 * 48 * 3);
        assert!(raw.iter().all(|b| *b == 255));
    }

    #[test]
    fn test_pages_keep_input_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("order.pdf");
        let colors = [Rgb([200, 10, 10]), Rgb([10, 200, 10]), Rgb([10, 10, 200])];
        let exporter = PdfExporter::new(ExportOptions {
            encoding: ImageEncoding::Flate,
            ..Default::default()
        });
        exporter.write(&painted_pages(&colors), &path).unwrap();

        let doc = Document::load(&path).unwrap();
        let page_ids = doc.get_pages();
        assert_eq!(page_ids.len(), 3);
        for (number, color) in (1u32..).zip(colors) {
            let raw = inflate(page_image(&doc, page_ids[&number]));
            assert_eq!(&raw[..3], &color.0, "page {number}");
            // Outside the first slot stays white
            assert_eq!(&raw[raw.len() - 3..], &[255, 255, 255]);
        }
    }

    #[test]
    fn test_unwritable_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("out.pdf");
        let err = export_pdf(&pages(1, 4, 4), &path).unwrap_err();
        assert!(matches!(err, GridError::DocumentWriteFailed { .. }));
        assert!(!path.exists());
    }
}
