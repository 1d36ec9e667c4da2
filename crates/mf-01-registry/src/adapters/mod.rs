//! Adapters layer: HTTP and in-memory implementations of the outbound ports.

pub mod http;
pub mod memory;

pub use http::{HttpDiscoveryClient, HttpHealthProbe};
pub use memory::{ManualTimeSource, MockHealthProbe, StaticDiscoverySource, SystemTimeSource};
