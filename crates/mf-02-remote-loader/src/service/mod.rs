//! Service layer: the session cache and the loader that drives the state machine.

pub mod cache;
pub mod loader;

pub use cache::RemoteLoadCache;
pub use loader::{LoadObserver, LoadReport, LoaderStats, RemoteLoader};
