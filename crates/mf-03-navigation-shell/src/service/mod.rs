//! # Service Layer
//!
//! - `core`: construction, route compilation, guards, error callbacks
//! - `navigate`: navigate, back/forward, pop-state, commit sequence
//! - `mount`: outlet and remote mounting

mod core;
mod mount;
mod navigate;


pub use self::core::{ErrorCallback, GuardHandle, NavigationShell, NavigationShellBuilder, NavigationStats};
pub use mount::OutletView;
