//! Channel lookup by UUID

pub mod postgres;

use async_trait::async_trait;
use metering_core::Result;
use uuid::Uuid;

use crate::types::Channel;

pub use postgres::PgEntityResolver;

#[async_trait]
pub trait EntityResolver: Send + Sync {
    /// Resolve a channel, failing with `NotFound` for unknown UUIDs
    async fn channel(&self, uuid: Uuid) -> Result<Channel>;
}
