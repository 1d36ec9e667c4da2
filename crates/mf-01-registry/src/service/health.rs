//! Health checks.
//!
//! A check snapshots `(slot, url)` under the read lock, probes without any
//! lock held, then writes the result back by slot. If the record was
//! unregistered while the probe was in flight the result is dropped.

use futures::future::join_all;
use tracing::{debug, warn};

use mf_shared_bus::BusEvent;
use mf_shared_types::MicrofrontendStatus;

use super::MicrofrontendRegistry;
use crate::domain::{apply_health, RegistryError, SlotId};
use crate::ports::HealthOutcome;

/// Summary of one sweep over all active records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthSweep {
    /// Records probed or assumed healthy.
    pub checked: usize,
    /// Records that came back healthy.
    pub healthy: usize,
    /// Records that came back unhealthy.
    pub unhealthy: usize,
}

impl MicrofrontendRegistry {
    /// Check one record's reachability and store the result.
    ///
    /// Host-linked records (no remote-entry URL) are healthy without a
    /// probe. A probe that overruns `health_check_timeout_ms` is unhealthy.
    ///
    /// # Errors
    /// `RegistryError::NotFound` for unknown ids.
    pub async fn perform_health_check(&self, id: &str) -> Result<bool, RegistryError> {
        let (slot, url) = self.health_target(id)?;
        let healthy = self.check_slot(id, slot, url.as_deref()).await;
        self.notify();
        Ok(healthy)
    }

    /// Check every active record concurrently.
    ///
    /// Subscribers are notified once after the whole sweep.
    pub async fn perform_all_health_checks(&self) -> HealthSweep {
        let targets: Vec<(String, SlotId, Option<String>)> = self
            .table
            .read()
            .entries()
            .filter(|(_, record)| record.is_active)
            .map(|(slot, record)| {
                (
                    record.id.clone(),
                    slot,
                    record.remote_entry_url().map(str::to_string),
                )
            })
            .collect();

        if targets.is_empty() {
            return HealthSweep::default();
        }

        let results = join_all(
            targets
                .iter()
                .map(|(id, slot, url)| self.check_slot(id, *slot, url.as_deref())),
        )
        .await;

        let healthy = results.iter().filter(|h| **h).count();
        let sweep = HealthSweep {
            checked: results.len(),
            healthy,
            unhealthy: results.len() - healthy,
        };
        debug!(
            checked = sweep.checked,
            healthy = sweep.healthy,
            unhealthy = sweep.unhealthy,
            "Health sweep complete"
        );
        self.notify();
        sweep
    }

    fn health_target(&self, id: &str) -> Result<(SlotId, Option<String>), RegistryError> {
        let table = self.table.read();
        let slot = table
            .slot_of(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        let url = table
            .get(id)
            .and_then(|record| record.remote_entry_url())
            .map(str::to_string);
        Ok((slot, url))
    }

    async fn check_slot(&self, id: &str, slot: SlotId, url: Option<&str>) -> bool {
        let healthy = match url {
            None => true,
            Some(url) => {
                let timeout = self.config.health_check_timeout();
                let outcome = tokio::time::timeout(timeout, self.probe.probe(url, timeout))
                    .await
                    .unwrap_or(HealthOutcome::TimedOut);
                if let HealthOutcome::Unhealthy(reason) = &outcome {
                    debug!(id = %id, url = %url, reason = %reason, "Probe failed");
                } else if outcome == HealthOutcome::TimedOut {
                    debug!(id = %id, url = %url, "Probe timed out");
                }
                outcome.is_healthy()
            }
        };

        let checked_at = self.now();
        let transition = {
            let mut table = self.table.write();
            match table.get_slot_mut(slot) {
                Some(record) => {
                    let before = record.status;
                    apply_health(record, healthy, checked_at);
                    Some((before, record.status))
                }
                None => None,
            }
        };

        match transition {
            Some((before, after)) if before != after => {
                if after == MicrofrontendStatus::Unhealthy {
                    warn!(id = %id, "Microfrontend became unhealthy");
                }
                self.emit(BusEvent::HealthChanged {
                    id: id.to_string(),
                    status: after,
                });
            }
            Some(_) => {}
            None => debug!(id = %id, "Record removed during health check, result dropped"),
        }
        healthy
    }
}
