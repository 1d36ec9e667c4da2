//! Ports layer for the Navigation Shell.

pub mod outbound;

pub use outbound::BrowserHistory;
