//! Interpreters turn a channel's raw tuples into aggregated output.
//!
//! Each declared [`ChannelType`](crate::types::ChannelType) maps to one
//! [`InterpreterKind`]; the [`InterpreterRegistry`] holds a constructor per kind.

mod accumulator;
pub mod aggregate;
mod meter;
mod sensor;

use async_trait::async_trait;
use metering_core::{MeteringError, Result};
use serde::Serialize;
use std::collections::HashMap;

use crate::options::RequestOptions;
use crate::storage::DataStore;
use crate::types::{AggregatedTuple, Channel};

pub use accumulator::AccumulatorInterpreter;
pub use aggregate::GroupBy;
pub use meter::MeterInterpreter;
pub use sensor::SensorInterpreter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpreterKind {
    Sensor,
    Meter,
    Accumulator,
}

/// Everything an interpreter is constructed with
#[derive(Debug, Clone)]
pub struct InterpreterParams {
    pub channel: Channel,
    pub from: Option<i64>,
    pub to: Option<i64>,
    /// Target number of output tuples
    pub tuples: Option<usize>,
    pub group: Option<GroupBy>,
    pub options: RequestOptions,
}

#[async_trait]
pub trait Interpreter: Send + Sync {
    fn kind(&self) -> InterpreterKind;

    fn params(&self) -> &InterpreterParams;

    fn channel(&self) -> &Channel {
        &self.params().channel
    }

    /// Read the channel's tuples within the configured range and aggregate them
    async fn load(&self, store: &dyn DataStore) -> Result<Vec<AggregatedTuple>>;
}

pub type InterpreterConstructor = fn(InterpreterParams) -> Box<dyn Interpreter>;

/// Constructors keyed by interpreter kind
pub struct InterpreterRegistry {
    constructors: HashMap<InterpreterKind, InterpreterConstructor>,
}

impl InterpreterRegistry {
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    pub fn register(&mut self, kind: InterpreterKind, constructor: InterpreterConstructor) {
        self.constructors.insert(kind, constructor);
    }

    /// Build the interpreter bound to the channel's declared type
    pub fn create(&self, params: InterpreterParams) -> Result<Box<dyn Interpreter>> {
        let kind = params.channel.channel_type.interpreter();
        let constructor = self.constructors.get(&kind).ok_or_else(|| {
            MeteringError::Internal(format!(
                "No interpreter registered for channel type '{}'",
                params.channel.channel_type
            ))
        })?;
        Ok(constructor(params))
    }
}

impl Default for InterpreterRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(InterpreterKind::Sensor, sensor);
        registry.register(InterpreterKind::Meter, meter);
        registry.register(InterpreterKind::Accumulator, accumulator);
        registry
    }
}

fn sensor(params: InterpreterParams) -> Box<dyn Interpreter> {
    Box::new(SensorInterpreter::new(params))
}

fn meter(params: InterpreterParams) -> Box<dyn Interpreter> {
    Box::new(MeterInterpreter::new(params))
}

fn accumulator(params: InterpreterParams) -> Box<dyn Interpreter> {
    Box::new(AccumulatorInterpreter::new(params))
}
