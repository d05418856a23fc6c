//! In-memory collaborators for exercising `DataService` without a database

use async_trait::async_trait;
use metering_core::{MeteringError, Result};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::entity::EntityResolver;
use crate::storage::DataStore;
use crate::types::{Channel, ChannelType, Interval, Tuple};

#[derive(Default)]
pub struct InMemoryEntities {
    channels: HashMap<Uuid, Channel>,
    lookups: Mutex<Vec<Uuid>>,
}

impl InMemoryEntities {
    pub fn with_channel(mut self, id: i32, channel_type: ChannelType) -> (Self, Uuid) {
        let uuid = Uuid::new_v4();
        self.channels.insert(
            uuid,
            Channel {
                id,
                uuid,
                channel_type,
                title: Some(format!("channel {}", id)),
            },
        );
        (self, uuid)
    }

    pub fn lookups(&self) -> Vec<Uuid> {
        self.lookups.lock().clone()
    }
}

#[async_trait]
impl EntityResolver for InMemoryEntities {
    async fn channel(&self, uuid: Uuid) -> Result<Channel> {
        self.lookups.lock().push(uuid);
        self.channels
            .get(&uuid)
            .cloned()
            .ok_or_else(|| MeteringError::NotFound(format!("No channel with uuid {}", uuid)))
    }
}

/// Statement issued against [`InMemoryStore`]
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Insert { channel: i32, rows: usize, skip_duplicates: bool },
    Delete { channel: i32, interval: Interval },
}

/// Rows keyed by (channel, timestamp), mirroring the unique constraint of `data`
#[derive(Default)]
pub struct InMemoryStore {
    rows: Mutex<BTreeMap<(i32, i64), f64>>,
    statements: Mutex<Vec<Statement>>,
}

impl InMemoryStore {
    pub fn seed(&self, channel: i32, tuples: &[Tuple]) {
        let mut rows = self.rows.lock();
        for t in tuples {
            rows.insert((channel, t.timestamp), t.value);
        }
    }

    pub fn tuples(&self, channel: i32) -> Vec<Tuple> {
        self.rows
            .lock()
            .range((channel, i64::MIN)..=(channel, i64::MAX))
            .map(|(&(_, ts), &value)| Tuple::new(ts, value))
            .collect()
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.statements.lock().clone()
    }
}

#[async_trait]
impl DataStore for InMemoryStore {
    async fn insert(&self, channel: &Channel, tuples: &[Tuple], skip_duplicates: bool) -> Result<u64> {
        if tuples.is_empty() {
            return Ok(0);
        }
        self.statements.lock().push(Statement::Insert {
            channel: channel.id,
            rows: tuples.len(),
            skip_duplicates,
        });

        let mut rows = self.rows.lock();
        if !skip_duplicates {
            let mut seen = std::collections::HashSet::new();
            for t in tuples {
                if rows.contains_key(&(channel.id, t.timestamp)) || !seen.insert(t.timestamp) {
                    return Err(MeteringError::Database(format!(
                        "duplicate key (channel_id, timestamp)=({}, {})",
                        channel.id, t.timestamp
                    )));
                }
            }
        }

        let mut inserted = 0;
        for t in tuples {
            let key = (channel.id, t.timestamp);
            if !rows.contains_key(&key) {
                rows.insert(key, t.value);
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn delete(&self, channel: &Channel, interval: Interval) -> Result<u64> {
        self.statements.lock().push(Statement::Delete {
            channel: channel.id,
            interval,
        });

        let mut rows = self.rows.lock();
        let before = rows.len();
        rows.retain(|&(id, ts), _| id != channel.id || !interval.contains(ts));
        Ok((before - rows.len()) as u64)
    }

    async fn read(&self, channel: &Channel, from: Option<i64>, to: Option<i64>) -> Result<Vec<Tuple>> {
        let from = from.unwrap_or(i64::MIN);
        let to = to.unwrap_or(i64::MAX);
        Ok(self
            .tuples(channel.id)
            .into_iter()
            .filter(|t| t.timestamp >= from && t.timestamp <= to)
            .collect())
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}
