//! # Persistence Flows
//!
//! State snapshots written through one host are restored by the next host
//! that opens the same storage.

#[cfg(test)]
mod tests {
    use serde_json::json;
    use std::sync::Arc;

    use host_runtime::MicrofrontendHost;
    use mf_shared_bus::{FileStorage, InMemoryStorage, KeyValueStorage};

    use crate::fixtures::{host_config, host_ports};

    async fn start_with(state: Arc<dyn KeyValueStorage>) -> MicrofrontendHost {
        let mut config = host_config("tab-1");
        config.bus.persist_state = true;
        MicrofrontendHost::start(
            config,
            host_ports().storage(state, Arc::new(InMemoryStorage::new())),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_state_survives_host_restart() {
        let dir = tempfile::tempdir().unwrap();

        {
            let storage = Arc::new(FileStorage::open(dir.path()).unwrap());
            let host = start_with(storage).await;
            host.bus().set_state("cart.items", json!(3)).unwrap();
            host.bus().set_state("user.profile.name", json!("ada")).unwrap();
            host.shutdown();
        }

        let storage = Arc::new(FileStorage::open(dir.path()).unwrap());
        let host = start_with(storage).await;
        assert_eq!(host.bus().get_state("cart.items"), Some(json!(3)));
        assert_eq!(host.bus().get_state("user.profile.name"), Some(json!("ada")));
    }

    #[tokio::test]
    async fn test_cleared_owner_is_not_restored() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(InMemoryStorage::new());

        {
            let host = start_with(Arc::clone(&storage)).await;
            host.bus().set_state("cart.items", json!(3)).unwrap();
            host.bus().set_state("user.id", json!(7)).unwrap();
            host.bus().clear_state("cart");
        }

        let host = start_with(storage).await;
        assert_eq!(host.bus().get_state("cart.items"), None);
        assert_eq!(host.bus().get_state("user.id"), Some(json!(7)));
    }
}
