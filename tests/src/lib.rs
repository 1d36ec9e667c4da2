//! # Microfrontend Runtime Test Suite
//!
//! Unified test crate for flows that cross component boundaries.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/
//! │   ├── fixtures.rs        # Pages, remote containers, host configs
//! │   └── integration/
//! │       ├── host_flows.rs  # Host startup, navigation → registry activity
//! │       ├── cross_window.rs# Two hosts sharing relay storage
//! │       └── persistence.rs # State snapshots across restarts
//! └── benches/
//!     └── runtime_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p mf-tests
//! cargo test -p mf-tests integration::host_flows
//! cargo bench -p mf-tests
//! ```

#![allow(dead_code)]

pub mod fixtures;
pub mod integration;
