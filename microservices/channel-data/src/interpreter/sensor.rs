//! Sensor channels: instantaneous readings, averaged per bucket

use async_trait::async_trait;
use metering_core::Result;

use super::{aggregate, Interpreter, InterpreterKind, InterpreterParams};
use crate::storage::DataStore;
use crate::types::AggregatedTuple;

pub struct SensorInterpreter {
    params: InterpreterParams,
}

impl SensorInterpreter {
    pub fn new(params: InterpreterParams) -> Self {
        Self { params }
    }
}

#[async_trait]
impl Interpreter for SensorInterpreter {
    fn kind(&self) -> InterpreterKind {
        InterpreterKind::Sensor
    }

    fn params(&self) -> &InterpreterParams {
        &self.params
    }

    async fn load(&self, store: &dyn DataStore) -> Result<Vec<AggregatedTuple>> {
        let p = &self.params;
        let raw = store.read(&p.channel, p.from, p.to).await?;

        Ok(aggregate::buckets(&raw, p.group, p.tuples)
            .into_iter()
            .filter_map(|bucket| {
                let last = bucket.last()?;
                let mean = bucket.iter().map(|t| t.value).sum::<f64>() / bucket.len() as f64;
                Some(AggregatedTuple {
                    timestamp: last.timestamp,
                    value: mean,
                    count: bucket.len(),
                })
            })
            .collect())
    }
}
