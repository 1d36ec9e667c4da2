//! # Time-Bounded Seen-Event Cache
//!
//! Drops duplicate relay deliveries of the same event id.
//!
//! - Ids are remembered for a validity window (default 10s, far longer than
//!   the relay retention so a record observed twice is always caught)
//! - Expired ids are garbage-collected on insert, bounding memory

use std::collections::HashMap;
use uuid::Uuid;

use mf_shared_types::Timestamp;

/// Time-bounded cache of event ids already delivered to this context.
pub struct SeenEventCache {
    /// Map of event id -> time it was first seen (ms).
    cache: HashMap<Uuid, u64>,

    /// How long an id is remembered, in milliseconds.
    validity_window_ms: u64,

    /// Last garbage collection timestamp.
    last_gc: u64,

    /// Garbage collection interval in milliseconds.
    gc_interval_ms: u64,
}

impl SeenEventCache {
    /// Default validity window.
    pub const DEFAULT_VALIDITY_WINDOW_MS: u64 = 10_000;

    /// Default garbage collection interval.
    pub const DEFAULT_GC_INTERVAL_MS: u64 = 1_000;

    /// Create a cache with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Self::DEFAULT_VALIDITY_WINDOW_MS, Self::DEFAULT_GC_INTERVAL_MS)
    }

    /// Create a cache with custom settings.
    #[must_use]
    pub fn with_config(validity_window_ms: u64, gc_interval_ms: u64) -> Self {
        Self {
            cache: HashMap::new(),
            validity_window_ms,
            last_gc: Timestamp::now().as_millis(),
            gc_interval_ms,
        }
    }

    /// Record `id` as seen.
    ///
    /// Returns `true` the first time an id is seen and `false` for repeats.
    pub fn first_sighting(&mut self, id: Uuid) -> bool {
        self.first_sighting_at(id, Timestamp::now().as_millis())
    }

    fn first_sighting_at(&mut self, id: Uuid, now: u64) -> bool {
        if now.saturating_sub(self.last_gc) > self.gc_interval_ms {
            self.garbage_collect(now);
            self.last_gc = now;
        }

        if self.cache.contains_key(&id) {
            return false;
        }
        self.cache.insert(id, now);
        true
    }

    /// Check if an id was seen without recording it.
    #[must_use]
    pub fn contains(&self, id: &Uuid) -> bool {
        self.cache.contains_key(id)
    }

    /// Number of remembered ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// True when no ids are remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn garbage_collect(&mut self, now: u64) {
        let expiry_threshold = now.saturating_sub(self.validity_window_ms);
        self.cache.retain(|_, &mut seen_at| seen_at > expiry_threshold);
    }
}

impl Default for SeenEventCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sighting() {
        let mut cache = SeenEventCache::new();
        let id = Uuid::new_v4();

        assert!(cache.first_sighting(id));
        assert!(!cache.first_sighting(id));
        assert!(cache.contains(&id));
    }

    #[test]
    fn test_expired_ids_are_collected() {
        let mut cache = SeenEventCache::with_config(100, 10);
        let old = Uuid::new_v4();
        let start = Timestamp::now().as_millis();

        assert!(cache.first_sighting_at(old, start));
        // Past the validity window: GC runs before the lookup.
        let later = start + 500;
        assert!(cache.first_sighting_at(Uuid::new_v4(), later));
        assert!(!cache.contains(&old));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_length() {
        let mut cache = SeenEventCache::new();
        assert!(cache.is_empty());
        for _ in 0..5 {
            cache.first_sighting(Uuid::new_v4());
        }
        assert_eq!(cache.len(), 5);
    }
}
