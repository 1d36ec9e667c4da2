//! In-process script transport.
//!
//! Maps remote-entry URLs to the containers "executing" them would register.
//! Counts every request so callers can verify the loader's at-most-once
//! guarantee, and can simulate failing, empty, slow or hanging entries.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{ContainerScope, LoadError, RemoteContainer};
use crate::ports::ScriptTransport;

#[derive(Clone)]
enum EntryBehavior {
    Register(Vec<Arc<dyn RemoteContainer>>),
    Fail(String),
    Hang,
}

/// Script transport backed by an in-memory URL table.
#[derive(Default)]
pub struct InMemoryScriptTransport {
    entries: RwLock<HashMap<String, EntryBehavior>>,
    requests: Mutex<HashMap<String, u32>>,
    latency: Duration,
}

impl InMemoryScriptTransport {
    /// Transport with no entries; every URL fails as not found.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every request by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Loading `url` registers `container` (in addition to any others).
    pub fn add_entry(&self, url: impl Into<String>, container: Arc<dyn RemoteContainer>) {
        let mut entries = self.entries.write();
        match entries.entry(url.into()).or_insert_with(|| EntryBehavior::Register(Vec::new())) {
            EntryBehavior::Register(containers) => containers.push(container),
            other => *other = EntryBehavior::Register(vec![container]),
        }
    }

    /// Loading `url` succeeds but registers nothing.
    pub fn add_empty_entry(&self, url: impl Into<String>) {
        self.entries
            .write()
            .insert(url.into(), EntryBehavior::Register(Vec::new()));
    }

    /// Loading `url` fails with `reason`.
    pub fn fail(&self, url: impl Into<String>, reason: impl Into<String>) {
        self.entries
            .write()
            .insert(url.into(), EntryBehavior::Fail(reason.into()));
    }

    /// Loading `url` never completes.
    pub fn hang(&self, url: impl Into<String>) {
        self.entries.write().insert(url.into(), EntryBehavior::Hang);
    }

    /// Requests made for `url`.
    #[must_use]
    pub fn request_count(&self, url: &str) -> u32 {
        self.requests.lock().get(url).copied().unwrap_or(0)
    }

    /// Requests made for all URLs.
    #[must_use]
    pub fn total_requests(&self) -> u32 {
        self.requests.lock().values().sum()
    }
}

#[async_trait]
impl ScriptTransport for InMemoryScriptTransport {
    async fn load_script(&self, url: &str, scope: &ContainerScope) -> Result<(), LoadError> {
        *self.requests.lock().entry(url.to_string()).or_default() += 1;
        let behavior = self.entries.read().get(url).cloned();

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match behavior {
            Some(EntryBehavior::Register(containers)) => {
                for container in containers {
                    scope.register(container);
                }
                Ok(())
            }
            Some(EntryBehavior::Fail(reason)) => Err(LoadError::RemoteScriptLoadFailed {
                url: url.to_string(),
                reason,
            }),
            Some(EntryBehavior::Hang) => std::future::pending().await,
            None => Err(LoadError::RemoteScriptLoadFailed {
                url: url.to_string(),
                reason: "404 Not Found".to_string(),
            }),
        }
    }
}
