//! # Merge Policies
//!
//! Two writers touch records outside of explicit API calls, and each has its
//! own policy:
//!
//! | Writer | Fields written |
//! |--------|----------------|
//! | Health check | `status`, `last_health_check_at` only |
//! | Discovery sync | everything else from the incoming record; health fields only when the incoming snapshot is fresher |
//!
//! Health checks and discovery syncs run on independent timers and may race
//! on one record. Merging per field means a stale discovery snapshot can
//! never overwrite a fresher health result.

use mf_shared_types::{MicrofrontendRecord, MicrofrontendStatus, Timestamp};

/// Combine an incoming discovery record with what the registry holds.
#[must_use]
pub fn merge_discovered(
    existing: Option<&MicrofrontendRecord>,
    mut incoming: MicrofrontendRecord,
    now: Timestamp,
) -> MicrofrontendRecord {
    let Some(existing) = existing else {
        if incoming.registered_at == Timestamp::default() {
            incoming.registered_at = now;
        }
        return incoming;
    };

    incoming.registered_at = existing.registered_at;
    incoming.last_activity_at = existing.last_activity_at.max(incoming.last_activity_at);

    let incoming_is_fresher = match (incoming.last_health_check_at, existing.last_health_check_at) {
        (Some(theirs), Some(ours)) => theirs > ours,
        (Some(_), None) => true,
        (None, _) => false,
    };
    if !incoming_is_fresher {
        incoming.status = existing.status;
        incoming.last_health_check_at = existing.last_health_check_at;
    }
    incoming
}

/// Record a health check result.
pub fn apply_health(record: &mut MicrofrontendRecord, healthy: bool, checked_at: Timestamp) {
    record.status = if healthy {
        MicrofrontendStatus::Healthy
    } else {
        MicrofrontendStatus::Unhealthy
    };
    record.last_health_check_at = Some(checked_at);
}
