//! Public record operations.

use tracing::{debug, info};

use mf_shared_bus::BusEvent;
use mf_shared_types::{MicrofrontendRecord, MicrofrontendStatus, RecordPatch, Timestamp};

use super::MicrofrontendRegistry;
use crate::domain::{RegistryError, SearchCriteria, Upsert};

/// Counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub total: usize,
    pub active: usize,
    pub healthy: usize,
    pub unhealthy: usize,
    pub loading: usize,
    pub unknown: usize,
}

impl MicrofrontendRegistry {
    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Insert a record, or replace the record with the same id.
    ///
    /// A re-registration keeps the original `registered_at`; every other
    /// field comes from the new record.
    ///
    /// # Errors
    /// `RegistryError::InvalidRecord` if the record fails validation.
    pub fn register(&self, mut record: MicrofrontendRecord) -> Result<(), RegistryError> {
        record.validate()?;
        let now = self.now();
        let id = record.id.clone();

        let outcome = {
            let mut table = self.table.write();
            record.registered_at = match table.get(&id) {
                Some(existing) => existing.registered_at,
                None if record.registered_at == Timestamp::default() => now,
                None => record.registered_at,
            };
            table.upsert(record)
        };

        match outcome {
            Upsert::Inserted(_) => info!(id = %id, "Microfrontend registered"),
            Upsert::Replaced(..) => info!(id = %id, "Microfrontend re-registered"),
        }
        self.emit(BusEvent::MicrofrontendRegistered { id });
        self.notify();
        Ok(())
    }

    /// Remove a record. Returns it if it existed.
    pub fn unregister(&self, id: &str) -> Option<MicrofrontendRecord> {
        let removed = self.table.write().remove(id)?;
        info!(id = %id, "Microfrontend unregistered");
        self.emit(BusEvent::MicrofrontendUnregistered { id: id.to_string() });
        self.notify();
        Some(removed)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    /// `RegistryError::NotFound` for unknown ids.
    pub fn update(
        &self,
        id: &str,
        patch: RecordPatch,
    ) -> Result<MicrofrontendRecord, RegistryError> {
        let updated = {
            let mut table = self.table.write();
            let record = table
                .get_mut(id)
                .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
            patch.apply(record);
            record.clone()
        };
        debug!(id = %id, status = %updated.status, "Microfrontend updated");
        self.emit(BusEvent::MicrofrontendUpdated { id: id.to_string() });
        self.notify();
        Ok(updated)
    }

    /// Record activity on a microfrontend. Returns false for unknown ids.
    ///
    /// Does not notify subscribers.
    pub fn touch(&self, id: &str) -> bool {
        let now = self.now();
        match self.table.write().get_mut(id) {
            Some(record) => {
                record.last_activity_at = Some(now);
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Record by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<MicrofrontendRecord> {
        self.table.read().get(id).cloned()
    }

    /// Every record in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<MicrofrontendRecord> {
        self.table.read().snapshot()
    }

    /// Records matching every populated criterion.
    #[must_use]
    pub fn search(&self, criteria: &SearchCriteria) -> Vec<MicrofrontendRecord> {
        self.table
            .read()
            .iter()
            .filter(|record| criteria.matches(record))
            .cloned()
            .collect()
    }

    /// Records with the given status.
    #[must_use]
    pub fn get_by_status(&self, status: MicrofrontendStatus) -> Vec<MicrofrontendRecord> {
        self.table
            .read()
            .iter()
            .filter(|record| record.status == status)
            .cloned()
            .collect()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Counts by status.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let table = self.table.read();
        let mut stats = RegistryStats {
            total: table.len(),
            ..RegistryStats::default()
        };
        for record in table.iter() {
            if record.is_active {
                stats.active += 1;
            }
            match record.status {
                MicrofrontendStatus::Healthy => stats.healthy += 1,
                MicrofrontendStatus::Unhealthy => stats.unhealthy += 1,
                MicrofrontendStatus::Loading => stats.loading += 1,
                MicrofrontendStatus::Unknown => stats.unknown += 1,
            }
        }
        stats
    }

    /// Error from the most recent failed discovery sync, cleared on success.
    #[must_use]
    pub fn last_error(&self) -> Option<RegistryError> {
        self.last_error.read().clone()
    }
}
