//! Render service - owns the worker thread and tracks in-flight requests

use std::collections::HashMap;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use flume::{Receiver, RecvTimeoutError, Sender};
use log::{debug, warn};

use crate::compositor::CompositeOptions;
use crate::document::DocumentSource;
use crate::regions::Region;

use super::PageRenderer;
use super::request::{LoadOptions, RenderRequest, RenderResponse, RequestId};
use super::types::SourceTile;
use super::worker::render_worker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingRequest {
    Load,
    Composite,
}

/// Asynchronous decode and composite on a background thread
pub struct RenderService {
    request_tx: Sender<RenderRequest>,
    response_rx: Receiver<RenderResponse>,
    next_request_id: u64,
    pending_requests: HashMap<RequestId, PendingRequest>,
    worker: Option<JoinHandle<()>>,
}

impl RenderService {
    /// Start the worker. `make_renderer` runs on the worker thread, so the
    /// renderer itself need not be `Send`. `composite_threads` sizes the pool
    /// compositing runs on (0 uses rayon's global pool).
    pub fn spawn<F>(make_renderer: F, composite_threads: usize) -> Self
    where
        F: FnOnce() -> Box<dyn PageRenderer> + Send + 'static,
    {
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        let worker = std::thread::Builder::new()
            .name("render-worker".to_string())
            .spawn(move || {
                let pool = if composite_threads > 0 {
                    rayon::ThreadPoolBuilder::new()
                        .num_threads(composite_threads)
                        .build()
                        .map_err(|e| warn!("Falling back to global rayon pool: {e}"))
                        .ok()
                } else {
                    None
                };
                render_worker(make_renderer(), pool, request_rx, response_tx);
            });

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                // Requests will go unanswered; callers see them as never finishing
                warn!("Failed to spawn render worker: {e}");
                None
            }
        };

        Self {
            request_tx,
            response_rx,
            next_request_id: 1,
            pending_requests: HashMap::new(),
            worker,
        }
    }

    /// Decode and rasterize a document
    pub fn load(&mut self, source: DocumentSource, options: LoadOptions) -> RequestId {
        let id = self.next_id();
        debug!("Requesting load of {} ({} bytes)", source.name, source.len());
        let _ = self.request_tx.send(RenderRequest::Load {
            id,
            source,
            options,
        });
        self.pending_requests.insert(id, PendingRequest::Load);
        id
    }

    /// Composite `regions` against `tiles`, one output tile per region
    pub fn composite(
        &mut self,
        regions: Vec<Region>,
        tiles: Vec<SourceTile>,
        options: CompositeOptions,
    ) -> RequestId {
        let id = self.next_id();
        let _ = self.request_tx.send(RenderRequest::Composite {
            id,
            regions,
            tiles,
            options,
        });
        self.pending_requests.insert(id, PendingRequest::Composite);
        id
    }

    /// Poll for completed responses without blocking
    pub fn poll_responses(&mut self) -> Vec<RenderResponse> {
        let mut responses = vec![];
        while let Ok(response) = self.response_rx.try_recv() {
            self.pending_requests.remove(&response.id());
            responses.push(response);
        }
        responses
    }

    /// Block until the next response arrives or `deadline` passes
    pub fn wait_response(&mut self, deadline: Instant) -> Option<RenderResponse> {
        let timeout = deadline.saturating_duration_since(Instant::now());
        match self.response_rx.recv_timeout(timeout) {
            Ok(response) => {
                self.pending_requests.remove(&response.id());
                Some(response)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Wait for every outstanding request, returning what arrived
    pub fn wait_idle(&mut self, timeout: Duration) -> Vec<RenderResponse> {
        let deadline = Instant::now() + timeout;
        let mut responses = vec![];
        while !self.is_idle() {
            match self.wait_response(deadline) {
                Some(response) => responses.push(response),
                None => break,
            }
        }
        responses
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending_requests.is_empty()
    }

    /// The worker is gone and every response it sent has been received
    #[must_use]
    pub fn is_disconnected(&self) -> bool {
        self.response_rx.is_disconnected() && self.response_rx.is_empty()
    }

    /// Forget outstanding requests after the worker stopped
    pub fn abandon_pending(&mut self) {
        if !self.pending_requests.is_empty() {
            warn!("Abandoning {} render requests", self.pending_requests.len());
            self.pending_requests.clear();
        }
    }

    #[must_use]
    pub fn is_pending(&self, id: RequestId) -> bool {
        self.pending_requests.contains_key(&id)
    }

    /// Shutdown the worker
    pub fn shutdown(&self) {
        let _ = self.request_tx.send(RenderRequest::Shutdown);
    }

    fn next_id(&mut self) -> RequestId {
        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        id
    }
}

impl Drop for RenderService {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for RenderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderService")
            .field("pending", &self.pending_requests.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::test_utils::{CrashingRenderer, FixedPageRenderer, solid_page};
    use image::Rgba;

    fn service() -> RenderService {
        RenderService::spawn(
            || {
                Box::new(FixedPageRenderer::new(vec![
                    solid_page(600, 800, Rgba([255, 0, 0, 255])),
                    solid_page(600, 800, Rgba([0, 0, 255, 255])),
                ]))
            },
            1,
        )
    }

    #[test]
    fn load_then_composite() {
        let mut service = service();
        let load = service.load(
            DocumentSource::from_bytes("two pages", vec![1u8]),
            LoadOptions::default(),
        );
        let responses = service.wait_idle(Duration::from_secs(5));
        assert!(service.is_idle());
        let tiles = match responses.into_iter().next() {
            Some(RenderResponse::Loaded { id, document }) => {
                assert_eq!(id, load);
                assert_eq!(document.tiles.len(), 2);
                assert_eq!(document.tiles[1].placement, Rect::new(0.0, 800.0, 600.0, 800.0));
                document.tiles
            }
            other => panic!("unexpected response {other:?}"),
        };

        let composite = service.composite(
            vec![Rect::new(0.0, 700.0, 600.0, 200.0)],
            tiles,
            CompositeOptions::default(),
        );
        assert!(service.is_pending(composite));
        let responses = service.wait_idle(Duration::from_secs(5));
        match responses.as_slice() {
            [RenderResponse::Composited { id, strip }] => {
                assert_eq!(*id, composite);
                assert_eq!(strip.tiles.len(), 1);
            }
            other => panic!("unexpected responses {other:?}"),
        }
    }

    #[test]
    fn worker_panic_disconnects_the_service() {
        let mut service = RenderService::spawn(|| Box::new(CrashingRenderer::after(0, vec![])), 1);
        let id = service.load(DocumentSource::from_bytes("doomed", vec![1u8]), LoadOptions::default());
        let responses = service.wait_idle(Duration::from_secs(5));
        assert!(responses.is_empty());
        assert!(service.is_pending(id));
        assert!(service.is_disconnected());

        service.abandon_pending();
        assert!(service.is_idle());
    }

    #[test]
    fn decode_failure_is_reported() {
        let mut service = service();
        let id = service.load(DocumentSource::from_bytes("empty", Vec::new()), LoadOptions::default());
        let responses = service.wait_idle(Duration::from_secs(5));
        assert!(matches!(
            responses.as_slice(),
            [RenderResponse::Failed { id: failed, .. }] if *failed == id
        ));
    }
}
