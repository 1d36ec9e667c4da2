//! # Microfrontend Runtime Telemetry
//!
//! Structured logging and Prometheus metrics for the host runtime.
//!
//! ## Components
//!
//! - **Logging**: `tracing` subscriber with JSON or pretty output and an
//!   `EnvFilter` driven by `MF_LOG_LEVEL` / `RUST_LOG`
//! - **Metrics**: a process-wide Prometheus registry with bus, loader,
//!   registry and navigation series
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mf_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! mf_telemetry::record_remote_load(0.120, None);
//! println!("{}", mf_telemetry::gather_metrics()?);
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use metrics::{
    gather_metrics, record_bus_event, record_health_transition, record_remote_load,
    register_metrics, set_bus_counter, set_discovery_error, set_navigation_count,
    set_registry_records, REGISTRY,
};

use thiserror::Error;

/// Telemetry initialization errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Metrics error: {0}")]
    Metrics(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Initialize logging and register metrics.
///
/// Keep the returned guard alive for the lifetime of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    logging::init_logging(&config)?;
    register_metrics()?;
    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Logs shutdown when dropped.
#[derive(Debug)]
pub struct TelemetryGuard {
    service_name: String,
}

impl TelemetryGuard {
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Telemetry shutting down");
    }
}
