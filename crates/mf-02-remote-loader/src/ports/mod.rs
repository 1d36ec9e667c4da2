//! Ports layer for the Remote Module Loader.

pub mod outbound;

pub use outbound::{HostModuleResolver, ScriptTransport};
