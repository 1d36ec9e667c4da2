//! # Prometheus Metrics
//!
//! Process-wide metric registry for the runtime. Component crates stay free
//! of prometheus; the host feeds these through the helper functions below.

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global registry for all runtime metrics.
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // SHARED STATE & EVENT BUS
    // =========================================================================

    /// Events emitted on the bus, by event type.
    pub static ref BUS_EVENTS: IntCounterVec = IntCounterVec::new(
        Opts::new("mf_bus_events_total", "Events emitted on the shared bus"),
        &["event_type"]
    ).expect("metric creation failed");

    /// Bus counters mirrored from `BusStats` (state_writes, relayed_out, ...).
    pub static ref BUS_COUNTERS: IntGaugeVec = IntGaugeVec::new(
        Opts::new("mf_bus_counter", "Shared bus activity counters"),
        &["kind"]
    ).expect("metric creation failed");

    // =========================================================================
    // REMOTE MODULE LOADER
    // =========================================================================

    /// Remote module loads by outcome (`ok` or an error kind).
    pub static ref REMOTE_LOADS: IntCounterVec = IntCounterVec::new(
        Opts::new("mf_remote_loads_total", "Remote module load attempts"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Remote module load duration.
    pub static ref REMOTE_LOAD_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new("mf_remote_load_duration_seconds", "Remote module load time")
            .buckets(exponential_buckets(0.005, 2.0, 12).unwrap_or_default())
    ).expect("metric creation failed");

    // =========================================================================
    // REGISTRY
    // =========================================================================

    /// Records per status.
    pub static ref REGISTRY_RECORDS: IntGaugeVec = IntGaugeVec::new(
        Opts::new("mf_registry_records", "Registered microfrontends by status"),
        &["status"]
    ).expect("metric creation failed");

    /// Health status transitions, by the new status.
    pub static ref HEALTH_TRANSITIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("mf_health_transitions_total", "Health status changes"),
        &["status"]
    ).expect("metric creation failed");

    /// Whether the last discovery sync failed (1) or not (0).
    pub static ref DISCOVERY_ERROR: IntGauge = IntGauge::new(
        "mf_discovery_error", "Last discovery sync failed"
    ).expect("metric creation failed");

    // =========================================================================
    // NAVIGATION SHELL
    // =========================================================================

    /// Navigation outcomes mirrored from `NavigationStats`.
    pub static ref NAVIGATIONS: IntGaugeVec = IntGaugeVec::new(
        Opts::new("mf_navigations", "Navigation attempts by outcome"),
        &["outcome"]
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(BUS_EVENTS.clone()),
        Box::new(BUS_COUNTERS.clone()),
        Box::new(REMOTE_LOADS.clone()),
        Box::new(REMOTE_LOAD_DURATION.clone()),
        Box::new(REGISTRY_RECORDS.clone()),
        Box::new(HEALTH_TRANSITIONS.clone()),
        Box::new(DISCOVERY_ERROR.clone()),
        Box::new(NAVIGATIONS.clone()),
    ];

    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::Metrics(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all registered metrics in the Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&families, &mut buffer)
        .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
}

// =============================================================================
// HELPERS
// =============================================================================

/// Count one bus event.
pub fn record_bus_event(event_type: &str) {
    BUS_EVENTS.with_label_values(&[event_type]).inc();
}

/// Mirror a bus counter.
pub fn set_bus_counter(kind: &str, value: u64) {
    BUS_COUNTERS.with_label_values(&[kind]).set(clamp(value));
}

/// Record a finished remote load. `error_kind` is `None` on success.
pub fn record_remote_load(seconds: f64, error_kind: Option<&str>) {
    REMOTE_LOADS
        .with_label_values(&[error_kind.unwrap_or("ok")])
        .inc();
    REMOTE_LOAD_DURATION.observe(seconds);
}

/// Set the record count for one status.
pub fn set_registry_records(status: &str, count: usize) {
    REGISTRY_RECORDS
        .with_label_values(&[status])
        .set(clamp(count as u64));
}

/// Count a health transition into `status`.
pub fn record_health_transition(status: &str) {
    HEALTH_TRANSITIONS.with_label_values(&[status]).inc();
}

/// Flag the discovery sync state.
pub fn set_discovery_error(failed: bool) {
    DISCOVERY_ERROR.set(i64::from(failed));
}

/// Mirror a navigation outcome counter.
pub fn set_navigation_count(outcome: &str, value: u64) {
    NAVIGATIONS.with_label_values(&[outcome]).set(clamp(value));
}

fn clamp(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
