//! # Key-Value Storage
//!
//! Storage port used for state snapshots and for the cross-window relay.
//!
//! A browser host backs this with session/local storage; the relay relies on
//! change notifications reaching every other context sharing the storage.
//! `InMemoryStorage` models that by letting several bus instances share one
//! `Arc<InMemoryStorage>`.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::BusError;

/// Buffered change notifications per storage observer.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Notification that a storage key changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    /// Key that changed.
    pub key: String,
    /// New value, `None` on removal.
    pub new_value: Option<String>,
}

/// Storage port.
pub trait KeyValueStorage: Send + Sync {
    /// Read a key.
    fn get(&self, key: &str) -> Result<Option<String>, BusError>;

    /// Write a key, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), BusError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), BusError>;

    /// All keys starting with `prefix`.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, BusError>;

    /// Observe changes made through this storage.
    fn changes(&self) -> broadcast::Receiver<StorageChange>;
}

// =============================================================================
// IN-MEMORY
// =============================================================================

/// Process-local storage with change notifications.
pub struct InMemoryStorage {
    entries: RwLock<BTreeMap<String, String>>,
    changes: broadcast::Sender<StorageChange>,
}

impl InMemoryStorage {
    /// Empty storage.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            entries: RwLock::new(BTreeMap::new()),
            changes,
        }
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn notify(&self, key: &str, new_value: Option<String>) {
        // No observers is fine.
        let _ = self.changes.send(StorageChange {
            key: key.to_string(),
            new_value,
        });
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStorage for InMemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, BusError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BusError> {
        self.entries.write().insert(key.to_string(), value.to_string());
        self.notify(key, Some(value.to_string()));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BusError> {
        if self.entries.write().remove(key).is_some() {
            self.notify(key, None);
        }
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, BusError> {
        Ok(self
            .entries
            .read()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn changes(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

// =============================================================================
// FILE-BACKED
// =============================================================================

/// One file per key inside a directory.
///
/// Used by native hosts to keep state snapshots across sessions. Change
/// notifications only cover writes made through this instance.
pub struct FileStorage {
    root: PathBuf,
    changes: broadcast::Sender<StorageChange>,
}

impl FileStorage {
    /// Open (creating if needed) a storage directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, BusError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        debug!(root = %root.display(), "Opened file storage");
        Ok(Self { root, changes })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", encode_key(key)))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, BusError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BusError> {
        fs::write(self.path_for(key), value)?;
        let _ = self.changes.send(StorageChange {
            key: key.to_string(),
            new_value: Some(value.to_string()),
        });
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BusError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => {
                let _ = self.changes.send(StorageChange {
                    key: key.to_string(),
                    new_value: None,
                });
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, BusError> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            let Some(stem) = name.strip_suffix(".json") else {
                continue;
            };
            if let Some(key) = decode_key(stem) {
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn changes(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

/// Hex-encode a key so any string maps to a safe file name.
fn encode_key(key: &str) -> String {
    hex::encode(key)
}

fn decode_key(encoded: &str) -> Option<String> {
    let bytes = hex::decode(encoded).ok()?;
    String::from_utf8(bytes).ok()
}
