//! # Record Table
//!
//! Arena of record slots addressed by monotonic slot ids, plus an
//! `id -> slot` index.
//!
//! Slot ids are never reused. A health check that snapshots `(slot, url)`,
//! suspends on the probe and then writes back by slot cannot land on a
//! record that was unregistered and re-registered in the meantime.
//! Iteration follows registration order.

use std::collections::{BTreeMap, HashMap};

use mf_shared_types::MicrofrontendRecord;

/// Stable handle to one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(u64);

impl SlotId {
    /// Raw value.
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Outcome of an upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upsert {
    /// A new slot was allocated.
    Inserted(SlotId),
    /// An existing slot was overwritten; carries the previous record.
    Replaced(SlotId, Box<MicrofrontendRecord>),
}

impl Upsert {
    /// Slot that now holds the record.
    #[must_use]
    pub fn slot(&self) -> SlotId {
        match self {
            Self::Inserted(slot) | Self::Replaced(slot, _) => *slot,
        }
    }
}

/// Id-unique record storage.
#[derive(Debug, Default)]
pub struct RecordTable {
    slots: BTreeMap<SlotId, MicrofrontendRecord>,
    index: HashMap<String, SlotId>,
    next_slot: u64,
}

impl RecordTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert, or overwrite the record with the same id in place.
    pub fn upsert(&mut self, record: MicrofrontendRecord) -> Upsert {
        if let Some(&slot) = self.index.get(&record.id) {
            if let Some(previous) = self.slots.insert(slot, record) {
                return Upsert::Replaced(slot, Box::new(previous));
            }
            return Upsert::Inserted(slot);
        }

        let slot = SlotId(self.next_slot);
        self.next_slot += 1;
        self.index.insert(record.id.clone(), slot);
        self.slots.insert(slot, record);
        Upsert::Inserted(slot)
    }

    /// Remove by id.
    pub fn remove(&mut self, id: &str) -> Option<MicrofrontendRecord> {
        let slot = self.index.remove(id)?;
        self.slots.remove(&slot)
    }

    /// Look up by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&MicrofrontendRecord> {
        self.slots.get(self.index.get(id)?)
    }

    /// Mutable lookup by id.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut MicrofrontendRecord> {
        let slot = *self.index.get(id)?;
        self.slots.get_mut(&slot)
    }

    /// Slot currently holding `id`.
    #[must_use]
    pub fn slot_of(&self, id: &str) -> Option<SlotId> {
        self.index.get(id).copied()
    }

    /// Mutable lookup by slot. `None` once the slot was vacated.
    pub fn get_slot_mut(&mut self, slot: SlotId) -> Option<&mut MicrofrontendRecord> {
        self.slots.get_mut(&slot)
    }

    /// Records in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &MicrofrontendRecord> {
        self.slots.values()
    }

    /// `(slot, record)` pairs in registration order.
    pub fn entries(&self) -> impl Iterator<Item = (SlotId, &MicrofrontendRecord)> {
        self.slots.iter().map(|(slot, record)| (*slot, record))
    }

    /// Owned copy of every record.
    #[must_use]
    pub fn snapshot(&self) -> Vec<MicrofrontendRecord> {
        self.slots.values().cloned().collect()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
