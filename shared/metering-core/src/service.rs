//! Service infrastructure for all microservices

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use crate::error::Result;

/// Health status for liveness probes
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub service_id: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Readiness status for readiness probes
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessStatus {
    pub ready: bool,
    pub dependencies: Vec<DependencyStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DependencyStatus {
    pub name: String,
    pub available: bool,
    pub latency_ms: Option<u64>,
}

/// Standard trait all microservices implement
#[async_trait]
pub trait MeteringService: Send + Sync + 'static {
    /// Service identifier (e.g., "channel-data")
    fn service_id(&self) -> &'static str;

    /// Service version
    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Health check - is the service alive?
    async fn health(&self) -> HealthStatus;

    /// Readiness check - are all dependencies available?
    async fn ready(&self) -> ReadinessStatus;

    /// Graceful shutdown
    async fn shutdown(&self) -> Result<()>;

    /// Start the service (HTTP server etc.)
    async fn start(&self) -> Result<()>;
}

/// Drives a [`MeteringService`] from start until Ctrl-C or SIGTERM
pub struct MicroserviceRuntime;

impl MicroserviceRuntime {
    pub async fn run<S: MeteringService>(service: Arc<S>) -> Result<()> {
        info!(
            service_id = service.service_id(),
            version = service.version(),
            "Starting microservice"
        );

        let server = tokio::spawn({
            let service = service.clone();
            async move {
                if let Err(e) = service.start().await {
                    error!(error = %e, "Service stopped with error");
                }
            }
        });

        shutdown_signal().await;
        info!("Shutdown signal received");

        if let Err(e) = service.shutdown().await {
            warn!(error = %e, "Shutdown failed");
        }
        server.abort();

        let health = service.health().await;
        info!(uptime_seconds = health.uptime_seconds, "Microservice stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
