//! # Cross-Window Flows
//!
//! Two hosts (two browsing contexts) share one relay storage. Events emitted
//! in one context are replayed in the other with their original source;
//! neither context sees its own events twice.

#[cfg(test)]
mod tests {
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    use host_runtime::MicrofrontendHost;
    use mf_shared_bus::{BusEvent, EventFilter, InMemoryStorage};

    use crate::fixtures::{eventually, host_config, host_ports};

    const WAIT: Duration = Duration::from_secs(2);

    async fn pair() -> (MicrofrontendHost, MicrofrontendHost) {
        let relay = Arc::new(InMemoryStorage::new());
        let mut a_config = host_config("tab-a");
        a_config.bus.cross_window = true;
        let mut b_config = host_config("tab-b");
        b_config.bus.cross_window = true;

        let a = MicrofrontendHost::start(
            a_config,
            host_ports().storage(Arc::new(InMemoryStorage::new()), relay.clone()),
        )
        .await
        .unwrap();
        let b = MicrofrontendHost::start(
            b_config,
            host_ports().storage(Arc::new(InMemoryStorage::new()), relay),
        )
        .await
        .unwrap();
        (a, b)
    }

    #[tokio::test]
    async fn test_navigation_is_relayed_to_other_context() {
        let (a, b) = pair().await;
        let mut from_a = b
            .bus()
            .events(EventFilter::from_sources(vec!["tab-a".to_string()]));

        assert!(a.navigate("/shop/cart").await.is_committed());

        let event = tokio::time::timeout(WAIT, from_a.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.source, "tab-a");
        assert!(matches!(
            event.event,
            BusEvent::NavigationChanged { ref to, .. } if to == "/shop/cart"
        ));

        // B's own shell did not move.
        assert_eq!(b.shell().state().current_path(), Some("/"));
    }

    #[tokio::test]
    async fn test_relayed_navigation_does_not_touch_foreign_registry() {
        let (a, b) = pair().await;

        a.navigate("/shop/cart").await;

        let a_registry = Arc::clone(a.registry());
        assert!(
            eventually(WAIT, || {
                a_registry
                    .get("cart")
                    .is_some_and(|r| r.last_activity_at.is_some())
            })
            .await
        );
        assert!(eventually(WAIT, || b.bus().stats().relayed_in > 0).await);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(b.registry().get("cart").unwrap().last_activity_at.is_none());
    }

    #[tokio::test]
    async fn test_custom_events_cross_once_without_echo() {
        let (a, b) = pair().await;
        let mut on_b = b.bus().events(EventFilter::all());
        let b_relayed_before = b.bus().stats().relayed_out;

        let sent = a
            .bus()
            .emit(BusEvent::custom("cart:checkout", json!({ "items": 2 })));

        let received = tokio::time::timeout(WAIT, on_b.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received.id, sent.id);
        assert_eq!(received.source, "tab-a");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(matches!(on_b.try_recv(), Ok(None)));
        // B replays the event locally but does not relay it back out.
        assert_eq!(b.bus().stats().relayed_out, b_relayed_before);
        assert!(a.bus().stats().echoes_dropped >= 1);
    }
}
