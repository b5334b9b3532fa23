pub mod identity;
pub mod kv;
pub mod persistence;
pub mod store;

/// A captured rectangle in content space
pub type Region = crate::geometry::Rect;

pub use identity::{DocumentIdentity, identify};
pub use kv::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};
pub use persistence::{PersistedRegionSet, RegionPersistence};
pub use store::RegionStore;
