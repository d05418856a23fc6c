//! Tuple storage

pub mod postgres;

use async_trait::async_trait;
use metering_core::Result;

use crate::types::{Channel, Interval, Tuple};

pub use postgres::PgDataStore;

/// PostgreSQL accepts at most 65535 bind parameters per statement; every
/// row binds two plus one shared channel id.
pub const MAX_TUPLES_PER_INSERT: usize = (u16::MAX as usize - 1) / 2;

#[async_trait]
pub trait DataStore: Send + Sync {
    /// Insert all tuples for `channel` in a single statement and return the
    /// number of rows written. With `skip_duplicates` rows colliding on
    /// (channel, timestamp) are ignored instead of failing the statement.
    async fn insert(&self, channel: &Channel, tuples: &[Tuple], skip_duplicates: bool) -> Result<u64>;

    /// Delete the channel's tuples inside `interval`, returning affected rows
    async fn delete(&self, channel: &Channel, interval: Interval) -> Result<u64>;

    /// Tuples of `channel` within the optional bounds, ordered by timestamp
    async fn read(&self, channel: &Channel, from: Option<i64>, to: Option<i64>) -> Result<Vec<Tuple>>;

    async fn is_healthy(&self) -> bool;
}
