//! # Shared Types Crate
//!
//! This crate contains the entities shared by every component of the
//! microfrontend runtime.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `MicrofrontendRecord` and `LoadConfig` are
//!   defined once and used by the registry, loader and navigation shell.
//! - **Wire Compatible**: records serialize with camelCase keys so discovery
//!   payloads deserialize without an intermediate DTO.
//! - **Read Snapshots Only**: the registry owns records; everybody else holds
//!   clones.

pub mod component;
pub mod entities;
pub mod errors;

pub use component::{Component, RemoteModule};
pub use entities::*;
pub use errors::RecordError;
