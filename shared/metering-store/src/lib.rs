//! Metering Store
//!
//! PostgreSQL connection pooling for the measurement database.

mod error;
mod pool;

pub use error::{Result, StoreError};
pub use pool::{PoolConfig, PoolStats, StorePool};

/// Re-export tokio-postgres types for convenience
pub use tokio_postgres::{types::ToSql, Row};
