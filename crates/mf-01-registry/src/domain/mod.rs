//! # Domain Layer
//!
//! Pure registry logic: the record table, search, merge policies and
//! configuration. No async, no I/O.

pub mod config;
pub mod errors;
pub mod merge;
pub mod search;
pub mod table;

pub use config::RegistryConfig;
pub use errors::RegistryError;
pub use merge::{apply_health, merge_discovered};
pub use search::SearchCriteria;
pub use table::{RecordTable, SlotId, Upsert};
