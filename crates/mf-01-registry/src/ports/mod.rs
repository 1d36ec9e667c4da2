//! Ports layer for the Microfrontend Registry.

pub mod outbound;

pub use outbound::{DiscoverySource, HealthOutcome, HealthProbe, TimeSource};
