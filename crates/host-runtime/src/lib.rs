//! # Microfrontend Host Runtime
//!
//! Composes the runtime components into one hosting page.
//!
//! ## Modular Structure
//!
//! - `config` - TOML host configuration and validation
//! - `routes` - configured route table to shell route nodes
//! - `wiring` - bus bridges between components and into metrics
//! - `host` - `MicrofrontendHost` lifecycle
//!
//! ## Component Graph
//!
//! ```text
//!                 ┌────────────────────┐
//!                 │   SharedStateBus   │◄──────────── microfrontends
//!                 └─────────┬──────────┘   set_state / emit / listen
//!          registry:*  ▲    │    ▲ navigation:changed
//!                      │    │    │
//! ┌────────────────────┴┐   │   ┌┴────────────────────┐
//! │ MicrofrontendRegistry│◄──┘   │   NavigationShell   │
//! │  health + discovery  │ touch │  routes + guards    │
//! └──────────────────────┘       └──────────┬──────────┘
//!                                           │ mount
//!                                ┌──────────▼──────────┐
//!                                │    RemoteLoader     │
//!                                └─────────────────────┘
//! ```
//!
//! The registry and the loader never talk to each other: the registry
//! describes what exists, routes decide what loads.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod host;
pub mod routes;
pub mod wiring;

pub use config::{ConfigError, HostConfig, RouteConfig};
pub use host::{HostError, HostPorts, MicrofrontendHost};
pub use routes::{build_routes, ComponentCatalog};
