//! Metering Core - Shared error taxonomy and service infrastructure
//!
//! This crate provides:
//! - Standard service trait all microservices implement
//! - Error handling utilities
//! - Configuration management

pub mod config;
pub mod error;
pub mod service;

pub use config::ServiceConfig;
pub use error::{MeteringError, Result};
pub use service::{DependencyStatus, HealthStatus, MeteringService, MicroserviceRuntime, ReadinessStatus};
