//! # Remote Load Cache
//!
//! Session-lifetime memory of which remote entries were fetched and which
//! containers were initialized for which share scope. Entries are never
//! evicted.
//!
//! Each entry is a `OnceCell`, so concurrent callers single-flight: the
//! first runs the operation and the rest wait for its outcome. A failed
//! operation leaves the cell empty, so the next caller retries.
//!
//! Script fetches are abandoned when the caller gives up. Container `init`
//! is not: it runs on its own task, because a container that has seen
//! `init` rejects a second one. A caller that times out leaves the init
//! running and the next caller waits on the same cell.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::domain::LoadError;

type Flight = Arc<OnceCell<()>>;

/// Container init identity: share scope, container name and the
/// container's registration generation.
type InitKey = (String, String, u64);

fn flight_for<K: Eq + Hash>(table: &Mutex<HashMap<K, Flight>>, key: K) -> Flight {
    Arc::clone(table.lock().entry(key).or_default())
}

fn is_done<K: Eq + Hash>(table: &Mutex<HashMap<K, Flight>>, key: &K) -> bool {
    table.lock().get(key).is_some_and(|cell| cell.initialized())
}

/// Script and container-init bookkeeping for one loader.
#[derive(Debug, Default)]
pub struct RemoteLoadCache {
    scripts: Mutex<HashMap<String, Flight>>,
    inits: Mutex<HashMap<InitKey, Flight>>,
}

impl RemoteLoadCache {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `fetch` unless `url` was already loaded.
    ///
    /// Returns `true` if this call performed the fetch.
    pub async fn ensure_script<F, Fut>(&self, url: &str, fetch: F) -> Result<bool, LoadError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), LoadError>>,
    {
        let cell = flight_for(&self.scripts, url.to_string());
        let mut performed = false;
        cell.get_or_try_init(|| {
            performed = true;
            fetch()
        })
        .await?;
        Ok(performed)
    }

    /// Run `init` unless this registration of `container` was already
    /// initialized for `scope`.
    ///
    /// `init` runs on a spawned task and completes even if this call is
    /// dropped. Returns `true` if this call performed the initialization.
    pub async fn ensure_init<F, Fut>(
        &self,
        scope: &str,
        container: &str,
        generation: u64,
        init: F,
    ) -> Result<bool, LoadError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), LoadError>> + Send + 'static,
    {
        let cell = flight_for(
            &self.inits,
            (scope.to_string(), container.to_string(), generation),
        );
        if cell.initialized() {
            return Ok(false);
        }

        let name = container.to_string();
        tokio::spawn(async move {
            let mut performed = false;
            cell.get_or_try_init(|| {
                performed = true;
                init()
            })
            .await?;
            Ok::<bool, LoadError>(performed)
        })
        .await
        .map_err(|e| LoadError::ContainerInitFailed {
            name,
            reason: e.to_string(),
        })?
    }

    /// True once `url` loaded successfully.
    #[must_use]
    pub fn is_script_loaded(&self, url: &str) -> bool {
        is_done(&self.scripts, &url.to_string())
    }

    /// True once any registration of `container` is initialized for `scope`.
    #[must_use]
    pub fn is_initialized(&self, scope: &str, container: &str) -> bool {
        self.inits
            .lock()
            .iter()
            .any(|((s, c, _), cell)| s == scope && c == container && cell.initialized())
    }

    /// Number of successfully loaded URLs.
    #[must_use]
    pub fn loaded_scripts(&self) -> usize {
        self.scripts.lock().values().filter(|c| c.initialized()).count()
    }

    /// Number of initialized (scope, container) pairs.
    #[must_use]
    pub fn initialized_containers(&self) -> usize {
        self.inits.lock().values().filter(|c| c.initialized()).count()
    }
}
