//! # Remote Module Loader
//!
//! Fetches, initializes and instantiates independently deployed modules at
//! run time, returning a mountable [`Component`](mf_shared_types::Component).
//!
//! ## Remote Entry Contract
//!
//! A remote entry is a script that, once executed, registers a named
//! container. The container supports `init(shared_scope)` (once per scope)
//! and `get(module) -> factory`; invoking the factory yields the module.
//!
//! ## Guarantees
//!
//! | Guarantee | Enforcement |
//! |-----------|-------------|
//! | At most one script request per URL, even under concurrent loads | `service/cache.rs` - per-URL `OnceCell` |
//! | At most one `init` per (share scope, container) | `service/cache.rs` - per-pair `OnceCell` |
//! | The caller always observes the deadline | `service/loader.rs` - `tokio::time::timeout` race |
//! | Failures are never cached | `OnceCell::get_or_try_init` leaves the cell empty |
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  adapters/ - InMemoryScriptTransport, HttpScriptTransport,      │
//! │              StaticHostResolver                                 │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ports/outbound.rs - ScriptTransport, HostModuleResolver        │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  service/ - RemoteLoader, RemoteLoadCache                       │
//! │  domain/  - container protocol, LoadPhase, LoadError, config    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! let loader = RemoteLoader::new(LoaderConfig::default(), transport, resolver);
//! let config = LoadConfig::remote("cart", "./Cart", "https://cdn/cart/remoteEntry.js")
//!     .with_fallback("https://static/cart/remoteEntry.js");
//! let component = loader.load_with_fallback(&config, Duration::from_secs(5)).await?;
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{HttpScriptTransport, InMemoryScriptTransport, ScriptEvaluator, StaticHostResolver};
pub use domain::*;
pub use ports::{HostModuleResolver, ScriptTransport};
pub use service::{LoadObserver, LoadReport, LoaderStats, RemoteLoadCache, RemoteLoader};
