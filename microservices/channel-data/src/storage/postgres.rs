//! PostgreSQL-backed tuple storage

use async_trait::async_trait;
use metering_core::Result;
use metering_store::{StoreError, StorePool, ToSql};
use tracing::{debug, instrument};

use super::DataStore;
use crate::types::{Channel, Interval, Tuple};

const DELETE_BOUNDED: &str = "DELETE FROM data WHERE channel_id = $1 AND timestamp >= $2 AND timestamp <= $3";
const DELETE_OPEN: &str = "DELETE FROM data WHERE channel_id = $1 AND timestamp >= $2";
const SELECT_RANGE: &str = "SELECT timestamp, value FROM data \
     WHERE channel_id = $1 AND timestamp >= $2 AND timestamp <= $3 \
     ORDER BY timestamp ASC";

/// One statement inserting `rows` tuples. `$1` is the channel id shared by
/// every row; each row binds its own timestamp and value.
pub(crate) fn insert_statement(rows: usize, skip_duplicates: bool) -> String {
    let templates: Vec<String> = (0..rows)
        .map(|i| format!("($1, ${}, ${})", 2 * i + 2, 2 * i + 3))
        .collect();

    let mut sql = format!(
        "INSERT INTO data (channel_id, timestamp, value) VALUES {}",
        templates.join(", ")
    );
    if skip_duplicates {
        sql.push_str(" ON CONFLICT (channel_id, timestamp) DO NOTHING");
    }
    sql
}

#[derive(Clone)]
pub struct PgDataStore {
    pool: StorePool,
}

impl PgDataStore {
    pub fn new(pool: StorePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DataStore for PgDataStore {
    #[instrument(skip(self, channel, tuples), fields(channel = channel.id, tuples = tuples.len()))]
    async fn insert(&self, channel: &Channel, tuples: &[Tuple], skip_duplicates: bool) -> Result<u64> {
        if tuples.is_empty() {
            return Ok(0);
        }

        let sql = insert_statement(tuples.len(), skip_duplicates);
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(1 + 2 * tuples.len());
        params.push(&channel.id);
        for tuple in tuples {
            params.push(&tuple.timestamp);
            params.push(&tuple.value);
        }

        let conn = self.pool.get().await?;
        let rows = conn
            .execute(sql.as_str(), &params)
            .await
            .map_err(StoreError::from)?;

        debug!(rows, "Insert executed");
        Ok(rows)
    }

    #[instrument(skip(self, channel), fields(channel = channel.id))]
    async fn delete(&self, channel: &Channel, interval: Interval) -> Result<u64> {
        let conn = self.pool.get().await?;
        let rows = match interval.to {
            Some(to) => conn.execute(DELETE_BOUNDED, &[&channel.id, &interval.from, &to]).await,
            None => conn.execute(DELETE_OPEN, &[&channel.id, &interval.from]).await,
        }
        .map_err(StoreError::from)?;

        debug!(rows, "Delete executed");
        Ok(rows)
    }

    #[instrument(skip(self, channel), fields(channel = channel.id))]
    async fn read(&self, channel: &Channel, from: Option<i64>, to: Option<i64>) -> Result<Vec<Tuple>> {
        let from = from.unwrap_or(i64::MIN);
        let to = to.unwrap_or(i64::MAX);

        let conn = self.pool.get().await?;
        let rows = conn
            .query(SELECT_RANGE, &[&channel.id, &from, &to])
            .await
            .map_err(StoreError::from)?;

        let mut tuples = Vec::with_capacity(rows.len());
        for row in &rows {
            let timestamp: i64 = row.try_get(0).map_err(StoreError::from)?;
            let value: f64 = row.try_get(1).map_err(StoreError::from)?;
            tuples.push(Tuple::new(timestamp, value));
        }
        Ok(tuples)
    }

    async fn is_healthy(&self) -> bool {
        self.pool.is_healthy().await
    }
}
