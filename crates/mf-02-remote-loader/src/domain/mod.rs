//! # Domain Layer
//!
//! Configuration, container protocol, load state machine and error kinds. No I/O.

pub mod config;
pub mod container;
pub mod errors;
pub mod phase;

pub use config::{LoaderConfig, DEFAULT_LOAD_TIMEOUT_MS};
pub use container::{
    ContainerScope, ModuleConstructor, ModuleFactory, RemoteContainer, SharedScope,
    StaticContainer,
};
pub use errors::LoadError;
pub use phase::LoadPhase;
