//! Render worker - runs in a separate thread

use flume::{Receiver, Sender};
use log::{debug, error};

use crate::compositor::composite_strip;

use super::PageRenderer;
use super::layout::load_document;
use super::request::{RenderRequest, RenderResponse};

/// Serve requests until `Shutdown` or until every sender is gone
pub fn render_worker(
    mut renderer: Box<dyn PageRenderer>,
    pool: Option<rayon::ThreadPool>,
    requests: Receiver<RenderRequest>,
    responses: Sender<RenderResponse>,
) {
    for request in requests {
        let response = match request {
            RenderRequest::Load {
                id,
                source,
                options,
            } => match load_document(renderer.as_mut(), &source, options) {
                Ok(document) => RenderResponse::Loaded { id, document },
                Err(fault) => {
                    error!("Failed to load {}: {fault}", source.name);
                    RenderResponse::Failed { id, fault }
                }
            },

            RenderRequest::Composite {
                id,
                regions,
                tiles,
                options,
            } => {
                let strip = match &pool {
                    Some(pool) => pool.install(|| composite_strip(&regions, &tiles, &options)),
                    None => composite_strip(&regions, &tiles, &options),
                };
                debug!("Composited {} regions for request {}", regions.len(), id.0);
                RenderResponse::Composited { id, strip }
            }

            RenderRequest::Shutdown => break,
        };

        if responses.send(response).is_err() {
            // Service dropped; nobody is listening
            break;
        }
    }
}
