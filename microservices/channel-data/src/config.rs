//! Channel Data Configuration

use metering_core::{MeteringError, Result, ServiceConfig};

use crate::storage::MAX_TUPLES_PER_INSERT;

#[derive(Debug, Clone)]
pub struct DataConfig {
    pub service: ServiceConfig,
    /// Upper bound on tuples accepted by a single `add`
    pub max_tuples_per_insert: usize,
}

impl DataConfig {
    pub fn from_env() -> Result<Self> {
        let mut service = ServiceConfig::from_env()?;
        if std::env::var("SERVICE_NAME").is_err() {
            service.service_name = "channel-data".to_string();
        }

        let max_tuples_per_insert = match std::env::var("MAX_TUPLES_PER_INSERT") {
            Ok(raw) => raw
                .parse::<usize>()
                .map_err(|e| MeteringError::Config(format!("Invalid MAX_TUPLES_PER_INSERT: {}", e)))?,
            Err(_) => MAX_TUPLES_PER_INSERT,
        };

        Ok(Self {
            service,
            max_tuples_per_insert,
        })
    }
}
