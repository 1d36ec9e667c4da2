//! # Shared State Store
//!
//! Keys are `owner.a.b.c`: the first segment names the owning module, the rest
//! is a path into that owner's JSON blob. Writes create intermediate objects
//! and replace only the leaf. The newest write for a key always wins.
//!
//! Observers hold `watch` receivers, so several writes between two polls
//! collapse into the latest value; nobody ever observes an overwritten
//! intermediate.

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::watch;

use crate::error::BusError;

/// Split a full key into its owner and path segments.
pub fn split_key(key: &str) -> Result<(&str, Vec<&str>), BusError> {
    let mut segments = key.split('.');
    let owner = segments.next().unwrap_or_default();
    let path: Vec<&str> = segments.collect();
    if owner.is_empty() || path.iter().any(|s| s.is_empty()) {
        return Err(BusError::InvalidKey(key.to_string()));
    }
    Ok((owner, path))
}

/// True if one key is the other, or an ancestor/descendant of it.
fn keys_overlap(a: &str, b: &str) -> bool {
    fn is_prefix(parent: &str, child: &str) -> bool {
        child.len() > parent.len()
            && child.starts_with(parent)
            && child.as_bytes()[parent.len()] == b'.'
    }
    a == b || is_prefix(a, b) || is_prefix(b, a)
}

fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}

/// Owner-partitioned JSON store with per-key watchers.
#[derive(Default)]
pub struct StateStore {
    owners: RwLock<BTreeMap<String, Value>>,
    watchers: RwLock<HashMap<String, watch::Sender<Option<Value>>>>,
}

impl StateStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the value at a full key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        let (owner, path) = split_key(key).ok()?;
        let owners = self.owners.read();
        let mut node = owners.get(owner)?;
        for segment in path {
            node = node.as_object()?.get(segment)?;
        }
        Some(node.clone())
    }

    /// Write `value` at `key`, returning the owner id.
    pub fn set(&self, key: &str, value: Value) -> Result<String, BusError> {
        let (owner, path) = split_key(key)?;
        {
            let mut owners = self.owners.write();
            let root = owners
                .entry(owner.to_string())
                .or_insert_with(|| Value::Object(Map::new()));

            match path.split_last() {
                None => *root = value,
                Some((leaf, parents)) => {
                    let mut node = root;
                    for segment in parents {
                        node = ensure_object(node)
                            .entry((*segment).to_string())
                            .or_insert_with(|| Value::Object(Map::new()));
                    }
                    ensure_object(node).insert((*leaf).to_string(), value);
                }
            }
        }
        self.notify_overlapping(key);
        Ok(owner.to_string())
    }

    /// The whole blob for an owner.
    #[must_use]
    pub fn owner_blob(&self, owner: &str) -> Option<Value> {
        self.owners.read().get(owner).cloned()
    }

    /// Replace an owner's blob wholesale (used when restoring snapshots).
    pub fn restore_owner(&self, owner: &str, blob: Value) {
        self.owners.write().insert(owner.to_string(), blob);
        self.notify_overlapping(owner);
    }

    /// Drop everything an owner stored. Returns `false` if it had nothing.
    pub fn clear(&self, owner: &str) -> bool {
        let removed = self.owners.write().remove(owner).is_some();
        if removed {
            self.notify_overlapping(owner);
        }
        removed
    }

    /// Snapshot of every owner's blob.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.owners.read().clone()
    }

    /// Observe a key. The receiver starts at the current value.
    pub fn watch(&self, key: &str) -> watch::Receiver<Option<Value>> {
        let current = self.get(key);
        let mut watchers = self.watchers.write();
        watchers
            .entry(key.to_string())
            .or_insert_with(|| watch::channel(current).0)
            .subscribe()
    }

    /// Number of keys with at least one live watcher.
    #[must_use]
    pub fn watched_keys(&self) -> usize {
        self.watchers
            .read()
            .values()
            .filter(|tx| tx.receiver_count() > 0)
            .count()
    }

    fn notify_overlapping(&self, written: &str) {
        let mut watchers = self.watchers.write();
        watchers.retain(|_, tx| tx.receiver_count() > 0);
        for (key, tx) in watchers.iter() {
            if !keys_overlap(key, written) {
                continue;
            }
            let latest = self.get(key);
            tx.send_if_modified(|current| {
                if *current == latest {
                    false
                } else {
                    *current = latest;
                    true
                }
            });
        }
    }
}
