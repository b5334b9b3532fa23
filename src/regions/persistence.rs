//! Region sets saved per document identity

use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

use super::identity::DocumentIdentity;
use super::kv::KeyValueStore;
use super::Region;

const KEY_PREFIX: &str = "regions:";

/// Stored shape of one document's regions
#[derive(Debug, Serialize, Deserialize)]
pub struct PersistedRegionSet {
    pub regions: Vec<Region>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

/// Best-effort region persistence over a [`KeyValueStore`].
///
/// Nothing here returns an error: write failures are logged and reads of
/// malformed data come back as absent.
pub struct RegionPersistence {
    store: Box<dyn KeyValueStore>,
}

impl RegionPersistence {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key(identity: &DocumentIdentity) -> String {
        format!("{KEY_PREFIX}{identity}")
    }

    /// Save the regions for a document. Returns whether the write succeeded.
    pub fn save(&mut self, identity: &DocumentIdentity, regions: &[Region]) -> bool {
        let set = PersistedRegionSet {
            regions: regions.to_vec(),
            saved_at: Some(Utc::now()),
        };
        let value = match serde_json::to_string(&set) {
            Ok(value) => value,
            Err(e) => {
                error!("Failed to encode regions for {identity}: {e}");
                return false;
            }
        };
        match self.store.set(&Self::key(identity), value) {
            Ok(()) => {
                debug!("Saved {} regions for {identity}", regions.len());
                true
            }
            Err(e) => {
                error!("Failed to save regions for {identity}: {e}");
                false
            }
        }
    }

    /// Load the regions for a document.
    ///
    /// Returns `None` when nothing is stored or when the stored entry fails
    /// validation (any rectangle without four finite numbers and a positive
    /// extent rejects the whole set).
    pub fn load(&self, identity: &DocumentIdentity) -> Option<Vec<Region>> {
        let raw = self.store.get(&Self::key(identity))?;
        let set: PersistedRegionSet = match serde_json::from_str(&raw) {
            Ok(set) => set,
            Err(e) => {
                warn!("Ignoring malformed regions for {identity}: {e}");
                return None;
            }
        };
        if let Some(bad) = set.regions.iter().find(|r| !r.is_valid()) {
            warn!("Ignoring regions for {identity}: invalid rectangle {bad:?}");
            return None;
        }
        debug!("Loaded {} regions for {identity}", set.regions.len());
        Some(set.regions)
    }
}

impl std::fmt::Debug for RegionPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionPersistence").finish_non_exhaustive()
    }
}
