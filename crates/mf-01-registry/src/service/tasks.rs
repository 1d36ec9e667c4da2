//! Background health and discovery loops.

use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use super::MicrofrontendRegistry;

/// Handles to the registry's periodic tasks. Dropping aborts them.
#[must_use = "dropping RegistryTasks stops the background loops"]
pub struct RegistryTasks {
    handles: Vec<JoinHandle<()>>,
}

impl RegistryTasks {
    /// Number of running loops.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// True when no loop was started.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Stop every loop.
    pub fn shutdown(mut self) {
        self.abort_all();
    }

    fn abort_all(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for RegistryTasks {
    fn drop(&mut self) {
        self.abort_all();
    }
}

impl MicrofrontendRegistry {
    /// Start the periodic health sweep, plus discovery sync when a
    /// discovery source is configured.
    ///
    /// The loops hold only a weak reference and exit once the registry is
    /// dropped.
    pub fn spawn_background_tasks(self: &Arc<Self>) -> RegistryTasks {
        let mut handles = Vec::with_capacity(2);

        handles.push(spawn_loop(
            Arc::downgrade(self),
            self.config.health_check_interval(),
            "health",
            |registry| async move {
                registry.perform_all_health_checks().await;
            },
        ));

        if self.has_discovery() {
            handles.push(spawn_loop(
                Arc::downgrade(self),
                self.config.sync_interval(),
                "discovery",
                |registry| async move {
                    // Failures are recorded in last_error.
                    let _ = registry.refresh_from_remote().await;
                },
            ));
        }

        info!(loops = handles.len(), "Registry background tasks started");
        RegistryTasks { handles }
    }
}

fn spawn_loop<F, Fut>(
    registry: Weak<MicrofrontendRegistry>,
    period: Duration,
    name: &'static str,
    tick: F,
) -> JoinHandle<()>
where
    F: Fn(Arc<MicrofrontendRegistry>) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send,
{
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let Some(registry) = registry.upgrade() else {
                debug!(loop_name = name, "Registry dropped, stopping loop");
                return;
            };
            tick(registry).await;
        }
    })
}
