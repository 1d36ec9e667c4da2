//! # Cross-Component Wiring
//!
//! Components never reference each other directly; the host connects them
//! through the bus.
//!
//! ```text
//! NavigationShell ──navigation:changed──→ Bus ──→ activity bridge ──→ Registry::touch
//!                                          │
//!                                          └────→ metrics bridge ──→ mf-telemetry
//! RemoteLoader ──LoadReport──→ load observer ──→ mf-telemetry
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use mf_01_registry::MicrofrontendRegistry;
use mf_02_remote_loader::{LoadObserver, LoadReport};
use mf_03_navigation_shell::NavigationShell;
use mf_shared_bus::{BusEvent, EventFilter, EventType, ListenerHandle, SharedStateBus};
use mf_shared_types::MicrofrontendStatus;

/// Id of the record that owns `remote_name`.
///
/// A record whose id equals the remote name wins; otherwise the first record
/// loading that remote.
pub fn owner_of(registry: &MicrofrontendRegistry, remote_name: &str) -> Option<String> {
    if registry.get(remote_name).is_some() {
        return Some(remote_name.to_string());
    }
    registry
        .list()
        .into_iter()
        .find(|record| record.load_config.remote_name == remote_name)
        .map(|record| record.id)
}

/// Touch the owning record whenever this context's shell commits a remote
/// route. Navigations relayed from other contexts are ignored.
pub fn spawn_activity_bridge(
    bus: &SharedStateBus,
    shell: Arc<NavigationShell>,
    registry: Arc<MicrofrontendRegistry>,
) -> ListenerHandle {
    let context_id = bus.context_id().to_string();
    bus.listen(EventType::NavigationChanged, move |event| {
        if event.source != context_id {
            return Ok(());
        }
        let BusEvent::NavigationChanged { to, .. } = &event.event else {
            return Ok(());
        };
        let Some(config) = shell.remote_for(to) else {
            return Ok(());
        };
        if let Some(id) = owner_of(&registry, &config.remote_name) {
            let touched = registry.touch(&id);
            debug!(path = %to, id = %id, touched, "Recorded microfrontend activity");
        }
        Ok(())
    })
}

/// Count every bus event and health transition.
pub fn spawn_metrics_bridge(bus: &SharedStateBus) -> JoinHandle<()> {
    let mut events = bus.events(EventFilter::all());
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            mf_telemetry::record_bus_event(event.event_type().as_str());
            if let BusEvent::HealthChanged { status, .. } = &event.event {
                mf_telemetry::record_health_transition(&status.to_string());
            }
        }
    })
}

/// Feed finished remote loads into the load metrics.
#[must_use]
pub fn load_metrics_observer() -> LoadObserver {
    Arc::new(|report: &LoadReport| {
        mf_telemetry::record_remote_load(report.duration.as_secs_f64(), report.error_kind);
    })
}

/// Mirror component counters into gauges.
pub fn refresh_metrics(
    bus: &SharedStateBus,
    registry: &MicrofrontendRegistry,
    shell: &NavigationShell,
) {
    let bus_stats = bus.stats();
    for (kind, value) in [
        ("events_emitted", bus_stats.events_emitted),
        ("state_writes", bus_stats.state_writes),
        ("relayed_out", bus_stats.relayed_out),
        ("relayed_in", bus_stats.relayed_in),
        ("echoes_dropped", bus_stats.echoes_dropped),
        ("duplicates_dropped", bus_stats.duplicates_dropped),
    ] {
        mf_telemetry::set_bus_counter(kind, value);
    }

    let registry_stats = registry.stats();
    for status in MicrofrontendStatus::ALL {
        let count = match status {
            MicrofrontendStatus::Healthy => registry_stats.healthy,
            MicrofrontendStatus::Unhealthy => registry_stats.unhealthy,
            MicrofrontendStatus::Loading => registry_stats.loading,
            MicrofrontendStatus::Unknown => registry_stats.unknown,
        };
        mf_telemetry::set_registry_records(&status.to_string(), count);
    }
    mf_telemetry::set_discovery_error(registry.last_error().is_some());

    let nav = shell.stats();
    for (outcome, value) in [
        ("committed", nav.committed),
        ("not_found", nav.not_found),
        ("rejected", nav.rejected),
        ("superseded", nav.superseded),
        ("mount_failed", nav.mount_failures),
    ] {
        mf_telemetry::set_navigation_count(outcome, value);
    }
}

/// Run [`refresh_metrics`] every `period`.
pub fn spawn_metrics_refresher(
    bus: SharedStateBus,
    registry: Arc<MicrofrontendRegistry>,
    shell: Arc<NavigationShell>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            refresh_metrics(&bus, &registry, &shell);
        }
    })
}
