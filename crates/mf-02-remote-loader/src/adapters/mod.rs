//! Adapters layer: script transports and host resolution.

pub mod host_resolver;
pub mod http;
pub mod in_memory;

pub use host_resolver::StaticHostResolver;
pub use http::{HttpScriptTransport, ScriptEvaluator};
pub use in_memory::InMemoryScriptTransport;
