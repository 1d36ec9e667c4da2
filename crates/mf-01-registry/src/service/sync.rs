//! Discovery sync.

use tracing::{debug, info, warn};

use mf_shared_bus::BusEvent;

use super::MicrofrontendRegistry;
use crate::domain::{merge_discovered, RegistryError};

impl MicrofrontendRegistry {
    /// Merge records from the discovery source.
    ///
    /// Records from other environments and invalid records are skipped.
    /// On failure the current records are kept and the error is stored in
    /// `last_error`. Returns the number of records merged; `Ok(0)` when no
    /// discovery source is configured.
    ///
    /// # Errors
    /// `RegistryError::DiscoveryFetchFailed` if the fetch fails.
    pub async fn refresh_from_remote(&self) -> Result<usize, RegistryError> {
        let Some(discovery) = &self.discovery else {
            return Ok(0);
        };

        let fetched = match discovery.fetch().await {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "Discovery sync failed, keeping current records");
                *self.last_error.write() = Some(err.clone());
                return Err(err);
            }
        };

        let now = self.now();
        let mut merged = 0;
        {
            let mut table = self.table.write();
            for incoming in fetched {
                if !self.config.accepts_environment(&incoming.environment) {
                    continue;
                }
                if let Err(err) = incoming.validate() {
                    debug!(id = %incoming.id, error = %err, "Skipping invalid discovered record");
                    continue;
                }
                let record = merge_discovered(table.get(&incoming.id), incoming, now);
                table.upsert(record);
                merged += 1;
            }
        }

        *self.last_error.write() = None;
        info!(merged, "Discovery sync complete");
        self.emit(BusEvent::DiscoverySynced { merged });
        self.notify();
        Ok(merged)
    }
}
