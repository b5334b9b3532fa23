//! Per-document state: viewport, regions, overlays, mode and tiles
//!
//! A session is created when a document finishes loading and replaced
//! wholesale by the next load, so nothing leaks between documents.

use log::info;

use crate::compositor::Strip;
use crate::document::DocumentSource;
use crate::geometry::Point;
use crate::mode::ModeController;
use crate::overlay::OverlayLayer;
use crate::regions::{DocumentIdentity, Region, RegionStore};
use crate::render::{LoadedDocument, SourceTile};
use crate::viewport::Viewport;

/// What a capture-or-delete commit did
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CaptureOutcome {
    Captured { index: usize, region: Region },
    Deleted { index: usize, region: Region },
    /// The visible rectangle was degenerate (e.g. zero-sized viewport)
    Rejected,
}

#[derive(Debug)]
pub struct DocumentSession {
    source: DocumentSource,
    identity: DocumentIdentity,
    pub(crate) viewport: Viewport,
    pub(crate) store: RegionStore,
    /// Regions as they were when the strip was entered
    pub(crate) snapshot: Vec<Region>,
    pub(crate) overlays: OverlayLayer,
    pub(crate) mode: ModeController,
    tiles: Vec<SourceTile>,
    pub(crate) strip: Option<Strip>,
}

impl DocumentSession {
    pub fn new(
        source: DocumentSource,
        identity: DocumentIdentity,
        document: LoadedDocument,
        mut viewport: Viewport,
    ) -> Self {
        viewport.set_content_size(document.content_size);
        Self {
            source,
            identity,
            viewport,
            store: RegionStore::new(),
            snapshot: Vec::new(),
            overlays: OverlayLayer::new(),
            mode: ModeController::new(),
            tiles: document.tiles,
            strip: None,
        }
    }

    pub fn source(&self) -> &DocumentSource {
        &self.source
    }

    pub fn identity(&self) -> &DocumentIdentity {
        &self.identity
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn regions(&self) -> &[Region] {
        self.store.list()
    }

    pub fn overlays(&self) -> &OverlayLayer {
        &self.overlays
    }

    pub fn mode(&self) -> &ModeController {
        &self.mode
    }

    pub fn tiles(&self) -> &[SourceTile] {
        &self.tiles
    }

    pub fn strip(&self) -> Option<&Strip> {
        self.strip.as_ref()
    }

    /// Delete the most recent region under the screen point `at`, or capture
    /// the visible content rectangle when nothing is there
    pub fn capture_or_delete(&mut self, at: Point) -> CaptureOutcome {
        let content_point = self.viewport.screen_to_content(at);
        let outcome = if let Some((index, region)) = self.store.take_containing(content_point) {
            info!("Deleted region {index} {region:?}");
            CaptureOutcome::Deleted { index, region }
        } else {
            let region = self.viewport.visible_content_rect();
            if self.store.add(region) {
                let index = self.store.len() - 1;
                info!("Captured region {index} {region:?}");
                CaptureOutcome::Captured { index, region }
            } else {
                CaptureOutcome::Rejected
            }
        };
        self.refresh_overlays();
        outcome
    }

    /// Reproject overlays after a viewport or region change (Viewing only)
    pub fn refresh_overlays(&mut self) {
        if self.overlays.is_visible() {
            self.overlays.rebuild(self.store.list(), &self.viewport);
        }
    }

    pub(crate) fn show_overlays(&mut self) {
        self.overlays.rebuild(self.store.list(), &self.viewport);
    }

    /// Hand the tiles to the compositor; the session keeps none while in Strip
    pub(crate) fn take_tiles(&mut self) -> Vec<SourceTile> {
        std::mem::take(&mut self.tiles)
    }

    pub(crate) fn install_tiles(&mut self, document: LoadedDocument) {
        self.viewport.set_content_size(document.content_size);
        self.tiles = document.tiles;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, Size};
    use crate::regions::identify;
    use crate::test_utils::{solid_page, source_tile};
    use crate::viewport::ViewportConfig;
    use image::Rgba;

    fn session() -> DocumentSession {
        let source = DocumentSource::from_bytes("doc", vec![1, 2, 3]);
        let identity = identify(&source);
        let document = LoadedDocument {
            tiles: vec![source_tile(
                1,
                Rect::new(0.0, 0.0, 1000.0, 2000.0),
                1.0,
                solid_page(1000, 2000, Rgba([0, 0, 0, 255])),
            )],
            content_size: Size::new(1000.0, 2000.0),
        };
        let viewport = Viewport::new(ViewportConfig::default(), Point::ORIGIN, Size::new(400.0, 300.0));
        let mut session = DocumentSession::new(source, identity, document, viewport);
        session.show_overlays();
        session
    }

    #[test]
    fn capture_equals_visible_rect() {
        let mut session = session();
        session.viewport.set_scale(2.0);
        session.viewport.set_scroll(Point::new(100.0, 300.0));
        let visible = session.viewport().visible_content_rect();

        let outcome = session.capture_or_delete(Point::new(200.0, 150.0));
        assert_eq!(outcome, CaptureOutcome::Captured { index: 0, region: visible });
        assert_eq!(session.regions(), &[visible]);
        assert_eq!(session.overlays().outlines().len(), 1);
    }

    #[test]
    fn second_press_inside_deletes() {
        let mut session = session();
        // (0, 0, 400, 300)
        let _ = session.capture_or_delete(Point::new(200.0, 150.0));
        session.viewport.set_scroll(Point::new(100.0, 100.0));
        // Content (450, 350) is outside the first region: (100, 100, 400, 300)
        let second = session.capture_or_delete(Point::new(350.0, 250.0));
        assert!(matches!(second, CaptureOutcome::Captured { index: 1, .. }));

        // Content (150, 150) is inside both; the newer one goes first
        let outcome = session.capture_or_delete(Point::new(50.0, 50.0));
        assert!(matches!(outcome, CaptureOutcome::Deleted { index: 1, .. }));
        assert_eq!(session.regions().len(), 1);
        assert_eq!(session.overlays().outlines().len(), 1);
    }

    #[test]
    fn tiles_move_out_and_back() {
        let mut session = session();
        let tiles = session.take_tiles();
        assert_eq!(tiles.len(), 1);
        assert!(session.tiles().is_empty());
        session.install_tiles(LoadedDocument {
            tiles,
            content_size: Size::new(1000.0, 2000.0),
        });
        assert_eq!(session.tiles().len(), 1);
    }
}
