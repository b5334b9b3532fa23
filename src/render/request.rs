//! Render request and response types

use crate::compositor::{CompositeOptions, Strip};
use crate::document::DocumentSource;
use crate::regions::Region;

use super::types::{LoadedDocument, SourceTile};

/// Unique identifier for render requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// How a document is laid out when loaded
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoadOptions {
    /// Raster pixels per content unit
    pub density: f64,
    /// Content units between stacked pages
    pub page_gap: f64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            density: 1.0,
            page_gap: 0.0,
        }
    }
}

/// Request sent to the render worker
#[derive(Debug)]
pub enum RenderRequest {
    /// Decode a document and rasterize all of its pages
    Load {
        id: RequestId,
        source: DocumentSource,
        options: LoadOptions,
    },

    /// Build one output tile per region
    Composite {
        id: RequestId,
        regions: Vec<Region>,
        tiles: Vec<SourceTile>,
        options: CompositeOptions,
    },

    /// Shutdown the worker
    Shutdown,
}

/// Errors from page renderers
#[derive(Debug, thiserror::Error)]
pub enum RenderFault {
    #[error("cannot decode document: {detail}")]
    Decode { detail: String },

    #[error("image: {0}")]
    Image(#[from] image::ImageError),

    #[error("archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("document has no pages")]
    EmptyDocument,

    #[error("render worker stopped")]
    WorkerStopped,

    #[cfg(feature = "pdf")]
    #[error("PDF engine: {0}")]
    Pdf(#[from] mupdf::error::Error),
}

impl RenderFault {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode { detail: msg.into() }
    }
}

/// Response from the render worker
#[derive(Debug)]
pub enum RenderResponse {
    Loaded { id: RequestId, document: LoadedDocument },

    Failed { id: RequestId, fault: RenderFault },

    Composited { id: RequestId, strip: Strip },
}

impl RenderResponse {
    pub fn id(&self) -> RequestId {
        match self {
            RenderResponse::Loaded { id, .. }
            | RenderResponse::Failed { id, .. }
            | RenderResponse::Composited { id, .. } => *id,
        }
    }
}
