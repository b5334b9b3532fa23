//! Pages from a single raster image or a ZIP archive of images

use std::io::{Cursor, Read};
use std::sync::Arc;

use image::{ImageFormat, RgbaImage};
use log::{debug, warn};
use zip::ZipArchive;

use crate::document::DocumentSource;
use crate::geometry::Size;
use crate::resample::{ResampleFilter, resize_rgba};

use super::PageRenderer;
use super::request::RenderFault;
use super::types::{PageHandle, RenderedPage};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Renders image-based documents. Content units are source pixels.
#[derive(Debug, Default)]
pub struct ImagePageRenderer {
    pages: Vec<Arc<RgbaImage>>,
    filter: ResampleFilter,
}

impl ImagePageRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter used when a page is rasterized at anything but 1:1
    #[must_use]
    pub fn with_filter(mut self, filter: ResampleFilter) -> Self {
        self.filter = filter;
        self
    }

    fn decode_archive(bytes: &[u8]) -> Result<Vec<RgbaImage>, RenderFault> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;

        let mut names = Vec::new();
        for i in 0..archive.len() {
            let entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            if ImageFormat::from_path(&name).is_ok() {
                names.push((name, i));
            } else {
                debug!("Skipping non-image archive entry {name}");
            }
        }
        names.sort();

        let mut pages = Vec::with_capacity(names.len());
        for (name, i) in names {
            let mut entry = archive.by_index(i)?;
            let mut buf = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut buf)?;
            match image::load_from_memory(&buf) {
                Ok(img) => pages.push(img.to_rgba8()),
                Err(e) => warn!("Skipping undecodable archive entry {name}: {e}"),
            }
        }
        Ok(pages)
    }
}

impl PageRenderer for ImagePageRenderer {
    fn decode(&mut self, source: &DocumentSource) -> Result<Vec<PageHandle>, RenderFault> {
        self.pages.clear();
        if source.is_empty() {
            return Err(RenderFault::decode(format!("{} is empty", source.name)));
        }

        let images = if source.bytes.starts_with(ZIP_MAGIC) {
            Self::decode_archive(&source.bytes)?
        } else {
            vec![image::load_from_memory(&source.bytes)?.to_rgba8()]
        };
        if images.is_empty() {
            return Err(RenderFault::EmptyDocument);
        }

        self.pages = images.into_iter().map(Arc::new).collect();
        Ok(self
            .pages
            .iter()
            .enumerate()
            .map(|(page_num, img)| PageHandle {
                page_num,
                size: Size::new(f64::from(img.width()), f64::from(img.height())),
            })
            .collect())
    }

    fn render_page(
        &self,
        page: &PageHandle,
        scale: f64,
        density: f64,
    ) -> Result<RenderedPage, RenderFault> {
        let img = self
            .pages
            .get(page.page_num)
            .ok_or_else(|| RenderFault::decode(format!("no page {}", page.page_num + 1)))?;

        let factor = scale * density;
        if (factor - 1.0).abs() < f64::EPSILON {
            return Ok(RenderedPage {
                pixel_width: img.width(),
                pixel_height: img.height(),
                raster: Arc::clone(img),
            });
        }

        let width = (f64::from(img.width()) * factor).round() as u32;
        let height = (f64::from(img.height()) * factor).round() as u32;
        Ok(RenderedPage::new(resize_rgba(img, width, height, self.filter)))
    }
}
