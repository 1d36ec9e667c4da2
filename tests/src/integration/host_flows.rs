//! # Host Flows
//!
//! End-to-end checks of `MicrofrontendHost` wiring:
//!
//! 1. **Bootstrap**: initial path commits with guards skipped
//! 2. **Activity**: committing a remote route touches the owning record
//! 3. **Mounting**: remote routes load through the shared loader
//! 4. **Discovery**: the first sync runs before the host reports started
//! 5. **Metrics**: counters reach the Prometheus registry

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use host_runtime::{ConfigError, HostError, MicrofrontendHost, RouteConfig};
    use mf_01_registry::{HealthOutcome, MockHealthProbe, StaticDiscoverySource};
    use mf_03_navigation_shell::{constant_guard, NavigationError, NavigationOutcome, OutletView};
    use mf_shared_bus::{BusEvent, EventFilter, EventType};
    use mf_shared_types::{LoadConfig, MicrofrontendRecord, MicrofrontendStatus};

    use crate::fixtures::{eventually, host_config, host_ports, CART_URL};

    const WAIT: Duration = Duration::from_secs(2);

    // =========================================================================
    // STARTUP
    // =========================================================================

    #[tokio::test]
    async fn test_host_bootstraps_initial_path() {
        let host = MicrofrontendHost::start(host_config("tab-1"), host_ports())
            .await
            .unwrap();

        assert!(host.bootstrap_outcome().is_committed());
        let state = host.shell().state();
        assert_eq!(state.current_path(), Some("/"));
        assert_eq!(state.history.len(), 1);
        assert!(matches!(host.shell().outlet(), OutletView::Ready { ref path, .. } if path == "/"));
        assert_eq!(host.registry().len(), 2);
        assert!(host.is_running());
    }

    #[tokio::test]
    async fn test_bootstrap_skips_guards_but_later_navigation_does_not() {
        let ports = host_ports().guard(constant_guard(false));
        let host = MicrofrontendHost::start(host_config("tab-1"), ports)
            .await
            .unwrap();

        assert!(host.bootstrap_outcome().is_committed());

        let outcome = host.navigate("/shop/cart").await;
        assert!(matches!(
            outcome,
            NavigationOutcome::Rejected(NavigationError::GuardRejected { .. })
        ));
        assert_eq!(host.shell().state().current_path(), Some("/"));
    }

    #[tokio::test]
    async fn test_unknown_initial_path_still_starts() {
        let mut config = host_config("tab-1");
        config.initial_path = "/nowhere".to_string();
        let host = MicrofrontendHost::start(config, host_ports()).await.unwrap();

        assert_eq!(host.bootstrap_outcome(), &NavigationOutcome::NotFound);
        assert!(host.shell().state().current_route.is_none());
    }

    #[tokio::test]
    async fn test_unknown_component_fails_start() {
        let mut config = host_config("tab-1");
        config.routes.push(RouteConfig {
            path: "/about".to_string(),
            component: Some("about".to_string()),
            ..RouteConfig::default()
        });

        let result = MicrofrontendHost::start(config, host_ports()).await;
        assert!(matches!(
            result,
            Err(HostError::Config(ConfigError::UnknownComponent { .. }))
        ));
    }

    #[tokio::test]
    async fn test_invalid_config_fails_start() {
        let mut config = host_config("tab-1");
        config.shell.load_timeout_ms = 0;

        let result = MicrofrontendHost::start(config, host_ports()).await;
        assert!(matches!(
            result,
            Err(HostError::Config(ConfigError::ZeroDuration { .. }))
        ));
    }

    #[tokio::test]
    async fn test_invalid_seed_record_fails_start() {
        let mut config = host_config("tab-1");
        config.microfrontends.push(MicrofrontendRecord::new(
            "",
            "Nameless",
            "0.0.1",
            LoadConfig::host_linked("x", "./X"),
        ));

        let result = MicrofrontendHost::start(config, host_ports()).await;
        assert!(matches!(result, Err(HostError::Config(ConfigError::InvalidRecord(_)))));
    }

    // =========================================================================
    // NAVIGATION → REGISTRY ACTIVITY
    // =========================================================================

    #[tokio::test]
    async fn test_remote_navigation_touches_owning_record() {
        let host = MicrofrontendHost::start(host_config("tab-1"), host_ports())
            .await
            .unwrap();
        assert!(host.registry().get("cart").unwrap().last_activity_at.is_none());

        assert!(host.navigate("/shop/cart").await.is_committed());

        let registry = Arc::clone(host.registry());
        assert!(
            eventually(WAIT, || {
                registry
                    .get("cart")
                    .is_some_and(|r| r.last_activity_at.is_some())
            })
            .await
        );
        assert!(registry.get("profile-mf").unwrap().last_activity_at.is_none());
    }

    #[tokio::test]
    async fn test_owner_found_by_remote_name() {
        let host = MicrofrontendHost::start(host_config("tab-1"), host_ports())
            .await
            .unwrap();

        // Record id "profile-mf" differs from the remote name "profile".
        assert!(host.navigate("/users/42").await.is_committed());

        let registry = Arc::clone(host.registry());
        assert!(
            eventually(WAIT, || {
                registry
                    .get("profile-mf")
                    .is_some_and(|r| r.last_activity_at.is_some())
            })
            .await
        );
    }

    #[tokio::test]
    async fn test_remote_route_mounts_component() {
        let host = MicrofrontendHost::start(host_config("tab-1"), host_ports())
            .await
            .unwrap();
        let mut outlet = host.shell().watch_outlet();

        host.navigate("/shop/cart").await;

        let view = tokio::time::timeout(
            WAIT,
            outlet.wait_for(|view| view.is_ready() && view.path() == Some("/shop/cart")),
        )
        .await
        .unwrap()
        .unwrap()
        .clone();
        match view {
            OutletView::Ready { component, .. } => assert_eq!(component.name(), "CartPage"),
            other => panic!("unexpected outlet {other:?}"),
        }
        assert_eq!(host.loader().stats().loads_succeeded, 1);
    }

    #[tokio::test]
    async fn test_navigation_events_reach_microfrontends() {
        let host = MicrofrontendHost::start(host_config("tab-1"), host_ports())
            .await
            .unwrap();
        let mut events = host
            .bus()
            .events(EventFilter::types(vec![EventType::NavigationChanged]));

        host.navigate("/users/7").await;

        let event = tokio::time::timeout(WAIT, events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.source, "tab-1");
        assert_eq!(
            event.event,
            BusEvent::NavigationChanged {
                to: "/users/7".to_string(),
                from: Some("/".to_string()),
            }
        );
    }

    // =========================================================================
    // DISCOVERY AND HEALTH
    // =========================================================================

    #[tokio::test]
    async fn test_initial_discovery_sync_runs_at_startup() {
        let discovered = MicrofrontendRecord::new(
            "search",
            "Search",
            "3.0.0",
            LoadConfig::remote("search", "./Search", "https://cdn.example.com/search.js"),
        );
        let discovery = Arc::new(StaticDiscoverySource::new(vec![discovered]));
        let ports = host_ports().discovery(discovery.clone());

        let host = MicrofrontendHost::start(host_config("tab-1"), ports)
            .await
            .unwrap();

        assert_eq!(discovery.fetches(), 1);
        assert!(host.registry().get("search").is_some());
        assert_eq!(host.registry().len(), 3);
        assert!(host.registry().last_error().is_none());
    }

    #[tokio::test]
    async fn test_failed_initial_discovery_keeps_seed_records() {
        let discovery = Arc::new(StaticDiscoverySource::new(Vec::new()));
        discovery.fail("connection refused");
        let ports = host_ports().discovery(discovery);

        let host = MicrofrontendHost::start(host_config("tab-1"), ports)
            .await
            .unwrap();

        assert_eq!(host.registry().len(), 2);
        assert!(host.registry().last_error().is_some());
    }

    #[tokio::test]
    async fn test_health_sweep_through_host_probe() {
        let probe = Arc::new(MockHealthProbe::new());
        probe.respond(CART_URL, HealthOutcome::Unhealthy("503".to_string()));
        let ports = host_ports().health_probe(probe);

        let host = MicrofrontendHost::start(host_config("tab-1"), ports)
            .await
            .unwrap();
        let sweep = host.registry().perform_all_health_checks().await;

        assert_eq!(sweep.checked, 2);
        assert_eq!(sweep.unhealthy, 1);
        assert_eq!(
            host.registry().get("cart").unwrap().status,
            MicrofrontendStatus::Unhealthy
        );
        assert_eq!(
            host.registry().get("profile-mf").unwrap().status,
            MicrofrontendStatus::Healthy
        );
    }

    // =========================================================================
    // METRICS AND SHUTDOWN
    // =========================================================================

    #[tokio::test]
    async fn test_metrics_reflect_host_activity() {
        mf_telemetry::register_metrics().unwrap();
        let host = MicrofrontendHost::start(host_config("tab-1"), host_ports())
            .await
            .unwrap();
        let mut outlet = host.shell().watch_outlet();
        host.navigate("/shop/cart").await;
        tokio::time::timeout(WAIT, outlet.wait_for(OutletView::is_ready))
            .await
            .unwrap()
            .unwrap();

        host.refresh_metrics();
        let text = mf_telemetry::gather_metrics().unwrap();

        assert!(text.contains("mf_navigations{outcome=\"committed\"}"));
        assert!(text.contains("mf_registry_records{status=\"unknown\"}"));
        assert!(text.contains("mf_remote_loads_total{outcome=\"ok\"}"));
        assert!(text.contains("mf_bus_counter{kind=\"events_emitted\"}"));
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let mut config = host_config("tab-1");
        config.background_tasks = true;
        let host = MicrofrontendHost::start(config, host_ports()).await.unwrap();
        assert!(host.is_running());

        host.shutdown();
        host.shutdown();
        assert!(!host.is_running());
    }
}
