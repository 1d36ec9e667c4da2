//! # Integration Flows
//!
//! - `host_flows`: startup, bootstrap navigation, registry activity, metrics
//! - `cross_window`: two hosts relaying events through shared storage
//! - `persistence`: state snapshots surviving a host restart

pub mod cross_window;
pub mod host_flows;
pub mod persistence;
