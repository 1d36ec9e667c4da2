//! # Service Layer
//!
//! `MicrofrontendRegistry` and its operations, split by concern:
//!
//! - `core`: construction, subscriptions and notification
//! - `api`: register, update, queries
//! - `health`: reachability checks
//! - `sync`: discovery merge
//! - `tasks`: periodic loops

mod api;
mod core;
mod health;
mod sync;
mod tasks;

#[cfg(test)]
mod tests;

pub use self::core::{MicrofrontendRegistry, RegistryBuilder, RegistryListener, RegistrySubscription};
pub use api::RegistryStats;
pub use health::HealthSweep;
pub use tasks::RegistryTasks;
