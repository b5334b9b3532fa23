use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors from a durable key-value store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("storage unavailable: {detail}")]
    Unavailable { detail: String },
}

/// Minimal string key-value store used as the persistence backend
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
}

/// Store that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// All entries in one JSON file, rewritten on every `set`
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonFileStore {
    entries: HashMap<String, String>,
    #[serde(skip)]
    file_path: Option<PathBuf>,
}

impl JsonFileStore {
    pub fn ephemeral() -> Self {
        Self {
            entries: HashMap::new(),
            file_path: None,
        }
    }

    pub fn with_file(file_path: &Path) -> Self {
        Self {
            entries: HashMap::new(),
            file_path: Some(file_path.to_path_buf()),
        }
    }

    /// Open the store at `file_path`; an unreadable file yields an empty
    /// store that will overwrite it on the next save
    pub fn load_or_empty(file_path: &Path) -> Self {
        Self::load_from_file(file_path).unwrap_or_else(|e| {
            log::error!("Failed to load region store from {}: {}", file_path.display(), e);
            Self::with_file(file_path)
        })
    }

    pub fn load_from_file(file_path: &Path) -> anyhow::Result<Self> {
        if file_path.exists() {
            let content = fs::read_to_string(file_path)?;
            let mut store: Self = serde_json::from_str(&content)?;
            store.file_path = Some(file_path.to_path_buf());
            Ok(store)
        } else {
            Ok(Self::with_file(file_path))
        }
    }

    pub fn save(&self) -> Result<(), StoreError> {
        match &self.file_path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        fs::create_dir_all(parent)?;
                    }
                }
                let content = serde_json::to_string_pretty(self)?;
                fs::write(path, content)?;
                Ok(())
            }
            None => {
                // Ephemeral stores don't save to disk
                Ok(())
            }
        }
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        self.save()
    }
}
