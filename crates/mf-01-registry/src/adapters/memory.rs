//! In-memory adapters for the outbound ports.
//!
//! Used by tests and by hosts that run without a discovery service.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use mf_shared_types::{MicrofrontendRecord, Timestamp};

use crate::domain::RegistryError;
use crate::ports::{DiscoverySource, HealthOutcome, HealthProbe, TimeSource};

// =============================================================================
// HEALTH PROBE
// =============================================================================

#[derive(Debug, Clone)]
enum ProbeBehavior {
    Respond(HealthOutcome),
    Hang,
}

/// Scripted health probe.
///
/// URLs without a scripted response answer with the default outcome
/// (`Healthy` unless changed).
pub struct MockHealthProbe {
    behaviors: RwLock<HashMap<String, ProbeBehavior>>,
    default: RwLock<HealthOutcome>,
    calls: Mutex<HashMap<String, u32>>,
}

impl Default for MockHealthProbe {
    fn default() -> Self {
        Self {
            behaviors: RwLock::new(HashMap::new()),
            default: RwLock::new(HealthOutcome::Healthy),
            calls: Mutex::new(HashMap::new()),
        }
    }
}

impl MockHealthProbe {
    /// Probe where everything is healthy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `outcome` for `url`.
    pub fn respond(&self, url: impl Into<String>, outcome: HealthOutcome) {
        self.behaviors
            .write()
            .insert(url.into(), ProbeBehavior::Respond(outcome));
    }

    /// Never answer for `url`.
    pub fn hang(&self, url: impl Into<String>) {
        self.behaviors.write().insert(url.into(), ProbeBehavior::Hang);
    }

    /// Outcome for unscripted URLs.
    pub fn set_default(&self, outcome: HealthOutcome) {
        *self.default.write() = outcome;
    }

    /// Probes issued for `url`.
    #[must_use]
    pub fn calls(&self, url: &str) -> u32 {
        self.calls.lock().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl HealthProbe for MockHealthProbe {
    async fn probe(&self, url: &str, _timeout: Duration) -> HealthOutcome {
        *self.calls.lock().entry(url.to_string()).or_default() += 1;
        let behavior = self.behaviors.read().get(url).cloned();
        match behavior {
            Some(ProbeBehavior::Respond(outcome)) => outcome,
            Some(ProbeBehavior::Hang) => std::future::pending().await,
            None => self.default.read().clone(),
        }
    }
}

// =============================================================================
// DISCOVERY
// =============================================================================

/// Discovery source serving a settable record list.
#[derive(Default)]
pub struct StaticDiscoverySource {
    records: RwLock<Vec<MicrofrontendRecord>>,
    failure: RwLock<Option<String>>,
    fetches: AtomicU64,
}

impl StaticDiscoverySource {
    /// Source serving `records`.
    #[must_use]
    pub fn new(records: Vec<MicrofrontendRecord>) -> Self {
        Self {
            records: RwLock::new(records),
            ..Self::default()
        }
    }

    /// Replace the served list.
    pub fn set_records(&self, records: Vec<MicrofrontendRecord>) {
        *self.records.write() = records;
    }

    /// Fail every fetch with `reason` until `recover` is called.
    pub fn fail(&self, reason: impl Into<String>) {
        *self.failure.write() = Some(reason.into());
    }

    /// Stop failing.
    pub fn recover(&self) {
        *self.failure.write() = None;
    }

    /// Number of fetches served (including failed ones).
    #[must_use]
    pub fn fetches(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiscoverySource for StaticDiscoverySource {
    async fn fetch(&self) -> Result<Vec<MicrofrontendRecord>, RegistryError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.failure.read().clone() {
            return Err(RegistryError::DiscoveryFetchFailed(reason));
        }
        Ok(self.records.read().clone())
    }
}

// =============================================================================
// TIME
// =============================================================================

/// Wall-clock time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Manually advanced time source.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    millis: AtomicU64,
}

impl ManualTimeSource {
    /// Start at `initial` ms.
    #[must_use]
    pub fn new(initial: u64) -> Self {
        Self {
            millis: AtomicU64::new(initial),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.millis.load(Ordering::SeqCst))
    }
}
