use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mf_shared_bus::{BusConfig, BusEvent, EventFilter, EventType, SharedStateBus};
use mf_shared_types::{
    LoadConfig, MicrofrontendMetadata, MicrofrontendRecord, MicrofrontendStatus, RecordPatch,
    Timestamp,
};

use super::*;
use crate::adapters::{ManualTimeSource, MockHealthProbe, StaticDiscoverySource};
use crate::domain::{RegistryConfig, RegistryError, SearchCriteria};
use crate::ports::HealthOutcome;

// =============================================================================
// FIXTURES
// =============================================================================

struct Fixture {
    registry: Arc<MicrofrontendRegistry>,
    probe: Arc<MockHealthProbe>,
    discovery: Arc<StaticDiscoverySource>,
    clock: Arc<ManualTimeSource>,
}

fn fixture_with(config: RegistryConfig, bus: Option<SharedStateBus>) -> Fixture {
    let probe = Arc::new(MockHealthProbe::new());
    let discovery = Arc::new(StaticDiscoverySource::default());
    let clock = Arc::new(ManualTimeSource::new(1_000));
    let mut builder = MicrofrontendRegistry::builder(config)
        .health_probe(probe.clone())
        .discovery(discovery.clone())
        .time_source(clock.clone());
    if let Some(bus) = bus {
        builder = builder.bus(bus);
    }
    Fixture {
        registry: Arc::new(builder.build().unwrap()),
        probe,
        discovery,
        clock,
    }
}

fn fixture() -> Fixture {
    fixture_with(RegistryConfig::default(), None)
}

fn remote(id: &str) -> MicrofrontendRecord {
    MicrofrontendRecord::new(
        id,
        id,
        "1.0.0",
        LoadConfig::remote(id, "./App", format!("https://cdn.example.com/{id}/remoteEntry.js")),
    )
}

fn linked(id: &str) -> MicrofrontendRecord {
    MicrofrontendRecord::new(id, id, "1.0.0", LoadConfig::host_linked(id, "./App"))
}

fn url_of(id: &str) -> String {
    format!("https://cdn.example.com/{id}/remoteEntry.js")
}

// =============================================================================
// REGISTRATION
// =============================================================================

#[test]
fn test_register_sets_registration_time() {
    let f = fixture();
    f.registry.register(remote("cart")).unwrap();

    let record = f.registry.get("cart").unwrap();
    assert_eq!(record.registered_at, Timestamp::from_millis(1_000));
    assert_eq!(record.status, MicrofrontendStatus::Unknown);
}

#[test]
fn test_reregister_keeps_first_registration_time() {
    let f = fixture();
    f.registry.register(remote("cart")).unwrap();
    f.clock.advance(5_000);

    let mut v2 = remote("cart");
    v2.version = "2.0.0".into();
    v2.registered_at = Timestamp::from_millis(99_999);
    f.registry.register(v2).unwrap();

    let record = f.registry.get("cart").unwrap();
    assert_eq!(record.version, "2.0.0");
    assert_eq!(record.registered_at, Timestamp::from_millis(1_000));
    assert_eq!(f.registry.len(), 1);
}

#[test]
fn test_register_rejects_invalid_record() {
    let f = fixture();
    let err = f.registry.register(linked("")).unwrap_err();
    assert!(matches!(err, RegistryError::InvalidRecord(_)));
    assert!(f.registry.is_empty());
}

#[test]
fn test_unregister_removes_from_every_query() {
    let f = fixture();
    let mut record = remote("cart");
    record.metadata = MicrofrontendMetadata {
        tags: vec!["commerce".into()],
        ..MicrofrontendMetadata::default()
    };
    f.registry.register(record).unwrap();
    f.registry.register(remote("profile")).unwrap();

    let removed = f.registry.unregister("cart").unwrap();
    assert_eq!(removed.id, "cart");

    assert!(f.registry.get("cart").is_none());
    assert!(f.registry.list().iter().all(|r| r.id != "cart"));
    for status in MicrofrontendStatus::ALL {
        assert!(f.registry.get_by_status(status).iter().all(|r| r.id != "cart"));
    }
    assert!(f
        .registry
        .search(&SearchCriteria::new().tag("commerce"))
        .is_empty());
    assert!(f.registry.unregister("cart").is_none());
}

#[test]
fn test_update_applies_patch() {
    let f = fixture();
    f.registry.register(remote("cart")).unwrap();

    let updated = f
        .registry
        .update("cart", RecordPatch::status(MicrofrontendStatus::Loading))
        .unwrap();
    assert_eq!(updated.status, MicrofrontendStatus::Loading);
    assert_eq!(f.registry.get_by_status(MicrofrontendStatus::Loading).len(), 1);
}

#[test]
fn test_update_unknown_is_not_found() {
    let f = fixture();
    let err = f
        .registry
        .update("ghost", RecordPatch::active(false))
        .unwrap_err();
    assert_eq!(err, RegistryError::NotFound("ghost".into()));
}

#[test]
fn test_list_keeps_registration_order() {
    let f = fixture();
    for id in ["c", "a", "b"] {
        f.registry.register(remote(id)).unwrap();
    }
    let ids: Vec<String> = f.registry.list().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
}

#[test]
fn test_search_combines_criteria() {
    let f = fixture();
    let mut cart = remote("cart");
    cart.name = "Shopping Cart".into();
    cart.metadata.capabilities = vec!["checkout".into()];
    f.registry.register(cart).unwrap();
    f.registry.register(remote("profile")).unwrap();

    let hits = f
        .registry
        .search(&SearchCriteria::new().name("shopping").capability("checkout"));
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "cart");

    let none = f
        .registry
        .search(&SearchCriteria::new().name("shopping").capability("auth"));
    assert!(none.is_empty());
}

#[test]
fn test_touch_updates_activity_without_notifying() {
    let f = fixture();
    f.registry.register(remote("cart")).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let _sub = f.registry.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    f.clock.advance(250);
    assert!(f.registry.touch("cart"));
    assert!(!f.registry.touch("ghost"));

    assert_eq!(
        f.registry.get("cart").unwrap().last_activity_at,
        Some(Timestamp::from_millis(1_250))
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_stats_counts_statuses() {
    let f = fixture();
    f.registry.register(remote("a")).unwrap();
    f.registry.register(remote("b")).unwrap();
    f.registry
        .update("b", RecordPatch::status(MicrofrontendStatus::Healthy))
        .unwrap();
    f.registry.update("a", RecordPatch::active(false)).unwrap();

    let stats = f.registry.stats();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.active, 1);
    assert_eq!(stats.healthy, 1);
    assert_eq!(stats.unknown, 1);
}

// =============================================================================
// SUBSCRIPTIONS
// =============================================================================

#[test]
fn test_subscriber_receives_snapshot_until_dropped() {
    let f = fixture();
    let seen = Arc::new(AtomicUsize::new(0));
    let sink = seen.clone();
    let sub = f.registry.subscribe(move |records| {
        sink.store(records.len(), Ordering::SeqCst);
    });

    f.registry.register(remote("a")).unwrap();
    f.registry.register(remote("b")).unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 2);
    assert_eq!(f.registry.subscriber_count(), 1);

    sub.unsubscribe();
    assert_eq!(f.registry.subscriber_count(), 0);
    f.registry.register(remote("c")).unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

#[test]
fn test_panicking_subscriber_does_not_block_others() {
    let f = fixture();
    let _bad = f.registry.subscribe(|_| panic!("listener bug"));
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let _good = f.registry.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    f.registry.register(remote("a")).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// =============================================================================
// HEALTH
// =============================================================================

#[tokio::test]
async fn test_health_check_healthy_and_unhealthy() {
    let f = fixture();
    f.registry.register(remote("up")).unwrap();
    f.registry.register(remote("down")).unwrap();
    f.probe
        .respond(url_of("down"), HealthOutcome::Unhealthy("HTTP 503".into()));

    assert!(f.registry.perform_health_check("up").await.unwrap());
    assert!(!f.registry.perform_health_check("down").await.unwrap());

    let up = f.registry.get("up").unwrap();
    assert_eq!(up.status, MicrofrontendStatus::Healthy);
    assert_eq!(up.last_health_check_at, Some(Timestamp::from_millis(1_000)));
    assert_eq!(
        f.registry.get("down").unwrap().status,
        MicrofrontendStatus::Unhealthy
    );
}

#[tokio::test]
async fn test_host_linked_record_is_healthy_without_probe() {
    let f = fixture();
    f.registry.register(linked("shell")).unwrap();

    assert!(f.registry.perform_health_check("shell").await.unwrap());
    assert_eq!(
        f.registry.get("shell").unwrap().status,
        MicrofrontendStatus::Healthy
    );
    assert!(f.registry.get("shell").unwrap().last_health_check_at.is_some());
}

#[tokio::test]
async fn test_health_check_unknown_id() {
    let f = fixture();
    let err = f.registry.perform_health_check("ghost").await.unwrap_err();
    assert_eq!(err, RegistryError::NotFound("ghost".into()));
}

#[tokio::test(start_paused = true)]
async fn test_hanging_probe_times_out_as_unhealthy() {
    let f = fixture();
    f.registry.register(remote("slow")).unwrap();
    f.registry
        .update("slow", RecordPatch::status(MicrofrontendStatus::Loading))
        .unwrap();
    f.probe.hang(url_of("slow"));

    let healthy = f.registry.perform_health_check("slow").await.unwrap();

    assert!(!healthy);
    let record = f.registry.get("slow").unwrap();
    assert_eq!(record.status, MicrofrontendStatus::Unhealthy);
    assert!(record.last_health_check_at.is_some());
}

#[tokio::test]
async fn test_sweep_skips_inactive_records() {
    let f = fixture();
    f.registry.register(remote("a")).unwrap();
    f.registry.register(remote("b")).unwrap();
    f.registry.register(remote("off")).unwrap();
    f.registry.update("off", RecordPatch::active(false)).unwrap();
    f.probe
        .respond(url_of("b"), HealthOutcome::Unhealthy("refused".into()));

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let _sub = f.registry.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let sweep = f.registry.perform_all_health_checks().await;

    assert_eq!(
        sweep,
        HealthSweep {
            checked: 2,
            healthy: 1,
            unhealthy: 1
        }
    );
    assert_eq!(f.probe.calls(&url_of("off")), 0);
    assert_eq!(
        f.registry.get("off").unwrap().status,
        MicrofrontendStatus::Unknown
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_health_change_is_published_on_bus() {
    let bus = SharedStateBus::new(BusConfig::default());
    let mut events = bus.events(EventFilter::types(vec![EventType::HealthChanged]));
    let f = fixture_with(RegistryConfig::default(), Some(bus));
    f.registry.register(remote("cart")).unwrap();

    f.registry.perform_health_check("cart").await.unwrap();
    // Same status again: no second event.
    f.registry.perform_health_check("cart").await.unwrap();

    let event = events.recv().await.unwrap();
    assert_eq!(
        event.event,
        BusEvent::HealthChanged {
            id: "cart".into(),
            status: MicrofrontendStatus::Healthy
        }
    );
    assert!(events.try_recv().unwrap().is_none());
}

// =============================================================================
// DISCOVERY
// =============================================================================

#[tokio::test]
async fn test_discovery_merges_matching_environment() {
    let f = fixture_with(RegistryConfig::default().with_environment("production"), None);
    f.discovery.set_records(vec![
        remote("cart").with_environment("production"),
        remote("beta").with_environment("staging"),
    ]);

    let merged = f.registry.refresh_from_remote().await.unwrap();

    assert_eq!(merged, 1);
    assert!(f.registry.get("cart").is_some());
    assert!(f.registry.get("beta").is_none());
    assert_eq!(
        f.registry.get("cart").unwrap().registered_at,
        Timestamp::from_millis(1_000)
    );
}

#[tokio::test]
async fn test_discovery_failure_keeps_records_and_sets_last_error() {
    let f = fixture();
    f.registry.register(remote("cart")).unwrap();
    f.discovery.fail("connection refused");

    let err = f.registry.refresh_from_remote().await.unwrap_err();
    assert!(matches!(err, RegistryError::DiscoveryFetchFailed(_)));
    assert_eq!(f.registry.last_error(), Some(err));
    assert!(f.registry.get("cart").is_some());

    f.discovery.recover();
    f.discovery.set_records(vec![remote("profile")]);
    f.registry.refresh_from_remote().await.unwrap();
    assert!(f.registry.last_error().is_none());
    assert_eq!(f.registry.len(), 2);
}

#[tokio::test]
async fn test_discovery_does_not_clobber_fresher_health() {
    let f = fixture();
    f.registry.register(remote("cart")).unwrap();
    f.probe
        .respond(url_of("cart"), HealthOutcome::Unhealthy("HTTP 500".into()));
    f.registry.perform_health_check("cart").await.unwrap();

    let mut stale = remote("cart");
    stale.version = "1.1.0".into();
    stale.status = MicrofrontendStatus::Healthy;
    f.discovery.set_records(vec![stale]);
    f.registry.refresh_from_remote().await.unwrap();

    let record = f.registry.get("cart").unwrap();
    assert_eq!(record.version, "1.1.0");
    assert_eq!(record.status, MicrofrontendStatus::Unhealthy);
}

#[tokio::test]
async fn test_without_discovery_refresh_is_noop() {
    let registry = MicrofrontendRegistry::builder(RegistryConfig::default())
        .health_probe(Arc::new(MockHealthProbe::new()))
        .build()
        .unwrap();
    assert!(!registry.has_discovery());
    assert_eq!(registry.refresh_from_remote().await.unwrap(), 0);
}

// =============================================================================
// BACKGROUND TASKS
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_background_loops_run_on_interval() {
    let config = RegistryConfig {
        health_check_interval_ms: 1_000,
        sync_interval_ms: 1_000,
        ..RegistryConfig::default()
    };
    let f = fixture_with(config, None);
    f.registry.register(remote("cart")).unwrap();

    let tasks = f.registry.spawn_background_tasks();
    assert_eq!(tasks.len(), 2);

    tokio::time::sleep(Duration::from_millis(2_500)).await;

    assert_eq!(f.probe.calls(&url_of("cart")), 2);
    assert_eq!(f.discovery.fetches(), 2);

    tasks.shutdown();
    tokio::time::sleep(Duration::from_millis(5_000)).await;
    assert_eq!(f.probe.calls(&url_of("cart")), 2);
}
