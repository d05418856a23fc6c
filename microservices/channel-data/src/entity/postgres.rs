//! Entity lookup against the `entities` table

use async_trait::async_trait;
use metering_core::{MeteringError, Result};
use metering_store::{StoreError, StorePool};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::EntityResolver;
use crate::types::{Channel, ChannelType};

const SELECT_CHANNEL: &str = "SELECT id, type, title FROM entities WHERE uuid = $1 AND class = 'channel'";

#[derive(Clone)]
pub struct PgEntityResolver {
    pool: StorePool,
}

impl PgEntityResolver {
    pub fn new(pool: StorePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityResolver for PgEntityResolver {
    #[instrument(skip(self))]
    async fn channel(&self, uuid: Uuid) -> Result<Channel> {
        let key = uuid.to_string();
        let conn = self.pool.get().await?;
        let row = conn
            .query_opt(SELECT_CHANNEL, &[&key])
            .await
            .map_err(StoreError::from)?
            .ok_or_else(|| MeteringError::NotFound(format!("No channel with uuid {}", uuid)))?;

        let id: i32 = row.try_get(0).map_err(StoreError::from)?;
        let declared: String = row.try_get(1).map_err(StoreError::from)?;
        let title: Option<String> = row.try_get(2).map_err(StoreError::from)?;
        let channel_type: ChannelType = declared.parse()?;

        debug!(id, %channel_type, "Channel resolved");
        Ok(Channel {
            id,
            uuid,
            channel_type,
            title,
        })
    }
}
