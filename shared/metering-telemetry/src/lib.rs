//! Metering Telemetry
//!
//! Structured tracing and in-process metrics for the metering services.

mod config;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{Counter, Histogram, HistogramSummary};
pub use tracing_setup::init_tracing;

/// Install the global subscriber for a service
pub fn init(service_name: &str) -> Result<(), TelemetryError> {
    let config = TelemetryConfig::from_env(service_name);
    init_tracing(&config)
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Tracing initialization failed: {0}")]
    TracingInit(String),
}
