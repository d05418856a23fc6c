//! Connection Pool for the measurement database

use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use metering_core::ServiceConfig;
use serde::Serialize;
use tokio_postgres::NoTls;
use tracing::{debug, info};

use crate::{Result, StoreError};

/// Pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub url: String,
    pub max_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            url: metering_core::config::DEFAULT_DATABASE_URL.to_string(),
            max_size: 16,
        }
    }
}

impl From<&ServiceConfig> for PoolConfig {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            url: config.database_url.clone(),
            max_size: config.database_pool_size,
        }
    }
}

/// Pooled PostgreSQL connections
#[derive(Clone)]
pub struct StorePool {
    pool: Pool,
}

impl StorePool {
    /// Create a new connection pool. Connections are opened lazily.
    pub fn new(config: PoolConfig) -> Result<Self> {
        info!(max_size = config.max_size, "Creating database connection pool");

        let pg_config: tokio_postgres::Config = config
            .url
            .parse()
            .map_err(|e| StoreError::Configuration(format!("Invalid URL: {}", e)))?;

        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let manager = Manager::from_config(pg_config, NoTls, manager_config);

        let pool = Pool::builder(manager)
            .max_size(config.max_size)
            .build()
            .map_err(|e| StoreError::Pool(e.to_string()))?;

        debug!("Database pool created successfully");

        Ok(Self { pool })
    }

    /// Get a connection from the pool
    pub async fn get(&self) -> Result<deadpool_postgres::Object> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Pool(e.to_string()))
    }

    /// Check pool health
    pub async fn is_healthy(&self) -> bool {
        match self.pool.get().await {
            Ok(conn) => conn.simple_query("SELECT 1").await.is_ok(),
            Err(_) => false,
        }
    }

    /// Get pool statistics
    pub fn stats(&self) -> PoolStats {
        let status = self.pool.status();
        PoolStats {
            size: status.size,
            available: status.available as usize,
            waiting: status.waiting,
        }
    }
}

/// Pool statistics
#[derive(Debug, Clone, Serialize)]
pub struct PoolStats {
    pub size: usize,
    pub available: usize,
    pub waiting: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_default() {
        let config = PoolConfig::default();
        assert_eq!(config.max_size, 16);
        assert!(config.url.starts_with("postgres://"));
    }

    #[test]
    fn test_invalid_url_is_configuration_error() {
        let config = PoolConfig {
            url: "not a url at all ://".to_string(),
            max_size: 1,
        };
        assert!(matches!(StorePool::new(config), Err(StoreError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_pool_health() {
        // Requires a running PostgreSQL instance
        let Ok(url) = std::env::var("DATABASE_URL") else {
            return;
        };

        let pool = StorePool::new(PoolConfig { url, max_size: 2 }).expect("pool");
        assert!(pool.is_healthy().await);
    }
}
