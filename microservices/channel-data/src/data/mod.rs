//! Data Service
//!
//! Read, append and delete operations on channel tuples:
//! - `get` resolves channels and builds their interpreters
//! - `add` normalizes a submission and writes it in one batched insert
//! - `delete` removes an interval from one or more channels

pub mod interval;
pub mod payload;

use metering_core::{MeteringError, Result};
use metering_telemetry::{Counter, Histogram};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::entity::EntityResolver;
use crate::interpreter::{GroupBy, Interpreter, InterpreterParams, InterpreterRegistry};
use crate::options::RequestOptions;
use crate::storage::{DataStore, MAX_TUPLES_PER_INSERT};
use crate::types::{DataQuery, RowCount};

use payload::Submission;

/// Process-local counters of the data endpoints
#[derive(Clone)]
pub struct DataMetrics {
    pub rows_inserted: Counter,
    pub rows_deleted: Counter,
    pub legacy_submissions: Counter,
    pub insert_latency_ms: Histogram,
}

impl Default for DataMetrics {
    fn default() -> Self {
        Self {
            rows_inserted: Counter::new("rows_inserted"),
            rows_deleted: Counter::new("rows_deleted"),
            legacy_submissions: Counter::new("legacy_submissions"),
            insert_latency_ms: Histogram::new("insert_latency_ms"),
        }
    }
}

#[derive(Clone)]
pub struct DataService {
    entities: Arc<dyn EntityResolver>,
    store: Arc<dyn DataStore>,
    interpreters: Arc<InterpreterRegistry>,
    max_tuples_per_insert: usize,
    metrics: DataMetrics,
}

impl DataService {
    pub fn new(
        entities: Arc<dyn EntityResolver>,
        store: Arc<dyn DataStore>,
        interpreters: Arc<InterpreterRegistry>,
    ) -> Self {
        Self {
            entities,
            store,
            interpreters,
            max_tuples_per_insert: MAX_TUPLES_PER_INSERT,
            metrics: DataMetrics::default(),
        }
    }

    /// Lower the per-request tuple cap; never raised above what one statement can bind
    pub fn with_max_tuples_per_insert(mut self, max: usize) -> Self {
        self.max_tuples_per_insert = max.min(MAX_TUPLES_PER_INSERT);
        self
    }

    pub fn store(&self) -> &dyn DataStore {
        self.store.as_ref()
    }

    pub fn metrics(&self) -> &DataMetrics {
        &self.metrics
    }

    /// One interpreter per UUID, in input order
    #[instrument(skip(self, query), fields(channels = uuids.len()))]
    pub async fn get(&self, uuids: &[Uuid], query: &DataQuery) -> Result<Vec<Box<dyn Interpreter>>> {
        let options = RequestOptions::parse(query.options());
        let (from, to) = interval::query_range(query.from(), query.to())?;
        let tuples = query.tuples().map(parse_tuple_count).transpose()?;
        let group = query.group().map(str::parse::<GroupBy>).transpose()?;

        let mut interpreters = Vec::with_capacity(uuids.len());
        for uuid in uuids {
            let channel = self.entities.channel(*uuid).await?;
            interpreters.push(self.interpreters.create(InterpreterParams {
                channel,
                from,
                to,
                tuples,
                group,
                options: options.clone(),
            })?);
        }
        Ok(interpreters)
    }

    /// Append the submitted tuples to a single channel
    #[instrument(skip(self, body, query), fields(body_len = body.len()))]
    pub async fn add(&self, uuid: Uuid, body: &[u8], query: &DataQuery) -> Result<RowCount> {
        let options = RequestOptions::parse(query.options());
        let channel = self.entities.channel(uuid).await?;

        let (tuples, submission) = payload::normalize(body, query.ts(), query.value())?;
        if submission == Submission::Legacy {
            self.metrics.legacy_submissions.inc();
        }
        if tuples.len() > self.max_tuples_per_insert {
            return Err(MeteringError::validation(format!(
                "Too many tuples in one request ({} > {})",
                tuples.len(),
                self.max_tuples_per_insert
            )));
        }

        if tuples.is_empty() {
            debug!(channel = %uuid, "Empty submission");
            return Ok(RowCount { rows: 0 });
        }

        let started = Instant::now();
        let rows = self
            .store
            .insert(&channel, &tuples, options.skip_duplicates())
            .await?;
        self.metrics
            .insert_latency_ms
            .record(started.elapsed().as_secs_f64() * 1000.0);
        self.metrics.rows_inserted.add(rows);

        debug!(
            channel = %uuid,
            submitted = tuples.len(),
            rows,
            skip_duplicates = options.skip_duplicates(),
            "Tuples added"
        );
        Ok(RowCount { rows })
    }

    /// Delete an interval from each channel in turn. The first unknown UUID
    /// aborts; channels already processed stay deleted.
    #[instrument(skip(self, query), fields(channels = uuids.len()))]
    pub async fn delete(&self, uuids: &[Uuid], query: &DataQuery) -> Result<RowCount> {
        let interval = interval::delete_interval(query.from(), query.to(), query.ts())?;

        let mut rows = 0;
        for uuid in uuids {
            let channel = self.entities.channel(*uuid).await?;
            let deleted = self.store.delete(&channel, interval).await?;
            self.metrics.rows_deleted.add(deleted);
            rows += deleted;
        }

        info!(from = interval.from, to = ?interval.to, rows, "Tuples deleted");
        Ok(RowCount { rows })
    }
}

fn parse_tuple_count(raw: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| MeteringError::validation(format!("Invalid tuples '{}'", raw)))
}
