//! Channel Data Service
//!
//! Time-series access for measurement channels:
//! - Query aggregated tuples through per-type interpreters
//! - Append tuples from JSON submissions or `ts`/`value` parameters
//! - Delete tuple ranges across one or more channels

use metering_core::{HealthStatus, MeteringError, MeteringService, MicroserviceRuntime, ReadinessStatus, Result};
use metering_store::{PoolConfig, StorePool};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

mod api;
mod config;
mod data;
mod entity;
mod interpreter;
mod options;
mod storage;
mod timestamp;
mod types;

#[cfg(test)]
mod testing;

pub use config::DataConfig;
pub use data::DataService;

#[tokio::main]
async fn main() -> Result<()> {
    metering_telemetry::init("channel-data")
        .map_err(|e| MeteringError::Internal(e.to_string()))?;

    info!("Starting Channel Data Service");

    let service = Arc::new(ChannelDataService::new()?);
    MicroserviceRuntime::run(service).await
}

pub struct ChannelDataService {
    config: DataConfig,
    pool: StorePool,
    data: DataService,
    start_time: Instant,
}

impl ChannelDataService {
    pub fn new() -> Result<Self> {
        let config = DataConfig::from_env()?;
        let pool = StorePool::new(PoolConfig::from(&config.service))?;

        let data = DataService::new(
            Arc::new(entity::PgEntityResolver::new(pool.clone())),
            Arc::new(storage::PgDataStore::new(pool.clone())),
            Arc::new(interpreter::InterpreterRegistry::default()),
        )
        .with_max_tuples_per_insert(config.max_tuples_per_insert);

        Ok(Self {
            config,
            pool,
            data,
            start_time: Instant::now(),
        })
    }
}

#[async_trait::async_trait]
impl MeteringService for ChannelDataService {
    fn service_id(&self) -> &'static str {
        api::SERVICE_ID
    }

    async fn health(&self) -> HealthStatus {
        api::health_status(self.start_time)
    }

    async fn ready(&self) -> ReadinessStatus {
        api::readiness_status(self.data.store()).await
    }

    async fn shutdown(&self) -> Result<()> {
        let stats = self.pool.stats();
        info!(
            pool_size = stats.size,
            pool_available = stats.available,
            "Shutting down Channel Data Service"
        );
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        info!(
            http = %self.config.service.http_bind,
            service = %self.config.service.service_name,
            "Starting Channel Data server"
        );

        let status = self.ready().await;
        if !status.ready {
            warn!("Database not reachable at startup");
        }

        let router = api::create_router(self.data.clone(), self.start_time);

        let listener = tokio::net::TcpListener::bind(&self.config.service.http_bind).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}
