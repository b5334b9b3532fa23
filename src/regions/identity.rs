//! Stable document fingerprints for keying persisted regions

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::DocumentSource;

/// Only this many leading bytes are hashed
pub const IDENTITY_PREFIX_BYTES: usize = 64 * 1024;

/// Identifies "the same document" across sessions.
///
/// Format: `<md5 of leading bytes>-<byte length>-<mtime unix millis>`, with
/// `0` for an unknown modification time.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentIdentity(String);

impl DocumentIdentity {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the identity of a document without hashing all of it
#[must_use]
pub fn identify(source: &DocumentSource) -> DocumentIdentity {
    let prefix_len = source.bytes.len().min(IDENTITY_PREFIX_BYTES);
    let digest = md5::compute(&source.bytes[..prefix_len]);
    let modified = source
        .modified
        .map(|m| m.timestamp_millis())
        .unwrap_or_default();
    DocumentIdentity(format!("{digest:x}-{}-{modified}", source.bytes.len()))
}
