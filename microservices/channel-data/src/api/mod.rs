//! API module - REST

pub mod rest;

pub use rest::{create_router, health_status, readiness_status, SERVICE_ID};
