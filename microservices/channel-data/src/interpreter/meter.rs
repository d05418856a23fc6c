//! Meter channels: each tuple counts impulses, summed per bucket

use async_trait::async_trait;
use metering_core::Result;

use super::{aggregate, Interpreter, InterpreterKind, InterpreterParams};
use crate::storage::DataStore;
use crate::types::AggregatedTuple;

pub struct MeterInterpreter {
    params: InterpreterParams,
}

impl MeterInterpreter {
    pub fn new(params: InterpreterParams) -> Self {
        Self { params }
    }
}

#[async_trait]
impl Interpreter for MeterInterpreter {
    fn kind(&self) -> InterpreterKind {
        InterpreterKind::Meter
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
                Some(AggregatedTuple {
                    timestamp: bucket.last()?.timestamp,
                    value: bucket.iter().map(|t| t.value).sum(),
                    count: bucket.len(),
                })
            })
            .collect())
    }
}
