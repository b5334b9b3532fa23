//! Document decoding and page rasterization
//!
//! Renderers turn document bytes into pages; the service runs them (and the
//! compositor) on a worker thread so the event loop never blocks.

pub mod image_renderer;
pub mod layout;
#[cfg(feature = "pdf")]
pub mod pdf_renderer;
pub mod request;
pub mod service;
pub mod types;
pub mod worker;

use crate::document::DocumentSource;
use crate::resample::ResampleFilter;

pub use image_renderer::ImagePageRenderer;
pub use layout::{load_document, stack_pages};
#[cfg(feature = "pdf")]
pub use pdf_renderer::PdfPageRenderer;
pub use request::{LoadOptions, RenderFault, RenderRequest, RenderResponse, RequestId};
pub use service::RenderService;
pub use types::{LoadedDocument, PageHandle, RenderedPage, SourceTile};

/// The external page-rendering service
pub trait PageRenderer {
    /// Split a document into pages. Replaces any previously decoded document.
    fn decode(&mut self, source: &DocumentSource) -> Result<Vec<PageHandle>, RenderFault>;

    /// Rasterize one page of the current document
    fn render_page(
        &self,
        page: &PageHandle,
        scale: f64,
        density: f64,
    ) -> Result<RenderedPage, RenderFault>;
}

/// Picks a renderer per document from its leading bytes
#[derive(Default)]
pub struct AutoPageRenderer {
    filter: ResampleFilter,
    current: Option<Box<dyn PageRenderer>>,
}

impl AutoPageRenderer {
    pub fn new(filter: ResampleFilter) -> Self {
        Self {
            filter,
            current: None,
        }
    }

    fn renderer_for(&self, source: &DocumentSource) -> Box<dyn PageRenderer> {
        #[cfg(feature = "pdf")]
        if source.bytes.starts_with(b"%PDF") {
            return Box::new(PdfPageRenderer::new());
        }
        #[cfg(not(feature = "pdf"))]
        if source.bytes.starts_with(b"%PDF") {
            log::warn!("{} looks like a PDF but PDF support is not compiled in", source.name);
        }
        Box::new(ImagePageRenderer::new().with_filter(self.filter))
    }
}

impl PageRenderer for AutoPageRenderer {
    fn decode(&mut self, source: &DocumentSource) -> Result<Vec<PageHandle>, RenderFault> {
        let mut renderer = self.renderer_for(source);
        self.current = None;
        let pages = renderer.decode(source)?;
        self.current = Some(renderer);
        Ok(pages)
    }

    fn render_page(
        &self,
        page: &PageHandle,
        scale: f64,
        density: f64,
    ) -> Result<RenderedPage, RenderFault> {
        self.current
            .as_ref()
            .ok_or_else(|| RenderFault::decode("no document loaded"))?
            .render_page(page, scale, density)
    }
}
