//! Store Error Types

use metering_core::MeteringError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    #[error("Pool error: {0}")]
    Pool(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<StoreError> for MeteringError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Configuration(msg) => MeteringError::Config(msg),
            other => MeteringError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_error_maps_to_database() {
        let err: MeteringError = StoreError::Pool("timed out".into()).into();
        assert!(matches!(err, MeteringError::Database(ref m) if m.contains("timed out")));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_configuration_error_maps_to_config() {
        let err: MeteringError = StoreError::Configuration("bad url".into()).into();
        assert!(matches!(err, MeteringError::Config(_)));
    }
}
