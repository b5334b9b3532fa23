//! PDF pages through MuPDF

use mupdf::{Colorspace, Document, Matrix, Pixmap};

use crate::document::DocumentSource;
use crate::geometry::Size;

use super::PageRenderer;
use super::request::RenderFault;
use super::types::{PageHandle, RenderedPage};

/// Renders PDF documents. Content units are PDF points.
///
/// `mupdf::Document` is not `Send`, so construct this on the thread that
/// renders (see [`super::RenderService::spawn`]).
#[derive(Default)]
pub struct PdfPageRenderer {
    doc: Option<Document>,
}

impl PdfPageRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PageRenderer for PdfPageRenderer {
    fn decode(&mut self, source: &DocumentSource) -> Result<Vec<PageHandle>, RenderFault> {
        self.doc = None;
        let doc = Document::from_bytes(&source.bytes, "application/pdf")?;
        let page_count = doc.page_count()?;
        if page_count <= 0 {
            return Err(RenderFault::EmptyDocument);
        }

        let mut pages = Vec::with_capacity(page_count as usize);
        for page_num in 0..page_count {
            let bounds = doc.load_page(page_num)?.bounds()?;
            pages.push(PageHandle {
                page_num: page_num as usize,
                size: Size::new(
                    f64::from(bounds.x1 - bounds.x0),
                    f64::from(bounds.y1 - bounds.y0),
                ),
            });
        }

        self.doc = Some(doc);
        Ok(pages)
    }

    fn render_page(
        &self,
        page: &PageHandle,
        scale: f64,
        density: f64,
    ) -> Result<RenderedPage, RenderFault> {
        let doc = self
            .doc
            .as_ref()
            .ok_or_else(|| RenderFault::decode("no document loaded"))?;
        let mupdf_page = doc.load_page(page.page_num as i32)?;

        let mag = (scale * density) as f32;
        let pixmap = mupdf_page.to_pixmap(
            &Matrix::new_scale(mag, mag),
            &Colorspace::device_rgb(),
            false,
            false,
        )?;
        Ok(RenderedPage::new(pixmap_to_rgba(&pixmap)?))
    }
}

fn pixmap_to_rgba(pixmap: &Pixmap) -> Result<image::RgbaImage, RenderFault> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(RenderFault::decode(format!(
            "Unsupported pixmap format: {n} channels"
        )));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
        return Err(RenderFault::decode("Pixmap buffer size mismatch"));
    }

    let mut out = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        let row = &samples[y * stride..y * stride + row_bytes];
        for px in row.chunks_exact(n) {
            out.extend_from_slice(&px[..3]);
            out.push(if n > 3 { px[3] } else { 255 });
        }
    }

    image::RgbaImage::from_raw(width as u32, height as u32, out)
        .ok_or_else(|| RenderFault::decode("Pixmap conversion failed"))
}
