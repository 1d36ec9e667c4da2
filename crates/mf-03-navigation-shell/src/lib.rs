//! # Navigation Shell
//!
//! Maps a logical path to a route in a static tree, enforces guard chains,
//! records history and drives which module is mounted.
//!
//! ## Resolution
//!
//! Depth-first, pre-order over the tree. A node matches when its pattern
//! matches the whole path. The **first match in tree order wins**; there is
//! no specificity ranking, so `["/a/*", "/a/b"]` sends `/a/b` to `/a/*`.
//! Configuration may rely on declaration order.
//!
//! ## Failure Policy
//!
//! | Situation | Result |
//! |-----------|--------|
//! | no route matches | `warn!`, `NavigationOutcome::NotFound`, state untouched |
//! | guard returns false | `on_error(GuardRejected)`, `Rejected`, state untouched |
//! | guard returns `Err` | `on_error(GuardFailed)`, `Rejected`, state untouched |
//! | remote module fails to load | outlet shows `Failed`, `on_error(MountFailed)` |
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  adapters/ - InMemoryBrowserHistory                             │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ports/outbound.rs - BrowserHistory                             │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  service/ - NavigationShell, OutletView                         │
//! │  domain/  - RouteNode, PathPattern, guards, NavigationState     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! let shell = NavigationShell::builder(ShellConfig::default())
//!     .route(RouteNode::component("/", home))
//!     .route(
//!         RouteNode::group("/shop")
//!             .guard(signed_in)
//!             .child(RouteNode::remote("cart", cart_config).title("Cart")),
//!     )
//!     .bus(bus.clone())
//!     .loader(loader.clone())
//!     .build()?;
//!
//! shell.navigate("/shop/cart", NavigateOptions::default()).await;
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::InMemoryBrowserHistory;
pub use domain::*;
pub use ports::BrowserHistory;
pub use service::{
    ErrorCallback, GuardHandle, NavigationShell, NavigationShellBuilder, NavigationStats,
    OutletView,
};
