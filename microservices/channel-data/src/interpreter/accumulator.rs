//! Accumulator channels store a cumulative meter reading. A bucket's value
//! is the consumption since the end of the previous bucket.

use async_trait::async_trait;
use metering_core::Result;

use super::{aggregate, Interpreter, InterpreterKind, InterpreterParams};
use crate::storage::DataStore;
use crate::types::AggregatedTuple;

pub struct AccumulatorInterpreter {
    params: InterpreterParams,
}

impl AccumulatorInterpreter {
    pub fn new(params: InterpreterParams) -> Self {
        Self { params }
    }
}

#[async_trait]
impl Interpreter for AccumulatorInterpreter {
    fn kind(&self) -> InterpreterKind {
        InterpreterKind::Accumulator
    }

    fn params(&self) -> &InterpreterParams {
        &self.params
    }

    async fn load(&self, store: &dyn DataStore) -> Result<Vec<AggregatedTuple>> {
        let p = &self.params;
        let raw = store.read(&p.channel, p.from, p.to).await?;

        let mut previous: Option<f64> = None;
        let mut out = Vec::new();
        for bucket in aggregate::buckets(&raw, p.group, p.tuples) {
            let (Some(first), Some(last)) = (bucket.first(), bucket.last()) else {
                continue;
            };
            let base = previous.unwrap_or(first.value);
            out.push(AggregatedTuple {
                timestamp: last.timestamp,
                value: last.value - base,
                count: bucket.len(),
            });
            previous = Some(last.value);
        }
        Ok(out)
    }
}
