//! # Microfrontend Registry
//!
//! Catalog of every known microfrontend: how to load it, where it is
//! deployed, and whether it is currently reachable.
//!
//! ## Responsibilities
//!
//! - Register, update and remove records; query by id, status or criteria
//! - Periodic reachability probes against each remote-entry URL
//! - Periodic merge from a remote discovery endpoint
//! - Notify subscribers with the full record list after each mutation
//!
//! ## Record Lifecycle
//!
//! ```text
//!   register ──→ [Unknown] ──probe ok──→ [Healthy]
//!                    │                     │   ↑
//!                    │                probe fail / timeout
//!                    │                     ↓   │
//!                    └──probe fail──→ [Unhealthy]
//!
//!   unregister: removed from get, list, search and get_by_status at once
//! ```
//!
//! Two timers write to records independently. Health checks own `status`
//! and `last_health_check_at`; discovery owns everything else (see
//! `domain/merge.rs`). A health result is written back by slot id, so a
//! probe that outlives its record is discarded.
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  adapters/ - HttpHealthProbe, HttpDiscoveryClient,              │
//! │              MockHealthProbe, StaticDiscoverySource, clocks     │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ports/outbound.rs - HealthProbe, DiscoverySource, TimeSource   │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  service/ - MicrofrontendRegistry, RegistryTasks                │
//! │  domain/  - RecordTable, SearchCriteria, merge, config, errors  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Bus Events
//!
//! | Operation | Event |
//! |-----------|-------|
//! | `register` | `registry:registered` |
//! | `unregister` | `registry:unregistered` |
//! | `update` | `registry:updated` |
//! | health check changing status | `registry:health` |
//! | successful discovery sync | `registry:synced` |

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{
    HttpDiscoveryClient, HttpHealthProbe, ManualTimeSource, MockHealthProbe,
    StaticDiscoverySource, SystemTimeSource,
};
pub use domain::*;
pub use ports::{DiscoverySource, HealthOutcome, HealthProbe, TimeSource};
pub use service::{
    HealthSweep, MicrofrontendRegistry, RegistryBuilder, RegistryListener, RegistryStats,
    RegistrySubscription, RegistryTasks,
};
