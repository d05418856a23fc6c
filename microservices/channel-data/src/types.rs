//! Channel Data Types

use metering_core::MeteringError;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::interpreter::InterpreterKind;

/// Measurement channel as registered in `entities`
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    /// Storage identifier, referenced by `data.channel_id`
    pub id: i32,
    pub uuid: Uuid,
    pub channel_type: ChannelType,
    pub title: Option<String>,
}

/// Declared channel type; decides which interpreter reads the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChannelType {
    #[serde(rename = "power")]
    Power,
    #[serde(rename = "gas")]
    Gas,
    #[serde(rename = "water")]
    Water,
    #[serde(rename = "heat")]
    Heat,
    #[serde(rename = "powersensor")]
    PowerSensor,
    #[serde(rename = "temperature")]
    Temperature,
    #[serde(rename = "pressure")]
    Pressure,
    #[serde(rename = "humidity")]
    Humidity,
    #[serde(rename = "voltage")]
    Voltage,
    #[serde(rename = "current")]
    Current,
    #[serde(rename = "electric meter")]
    ElectricMeter,
}

impl ChannelType {
    pub const ALL: [ChannelType; 11] = [
        Self::Power,
        Self::Gas,
        Self::Water,
        Self::Heat,
        Self::PowerSensor,
        Self::Temperature,
        Self::Pressure,
        Self::Humidity,
        Self::Voltage,
        Self::Current,
        Self::ElectricMeter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::Gas => "gas",
            Self::Water => "water",
            Self::Heat => "heat",
            Self::PowerSensor => "powersensor",
            Self::Temperature => "temperature",
            Self::Pressure => "pressure",
            Self::Humidity => "humidity",
            Self::Voltage => "voltage",
            Self::Current => "current",
            Self::ElectricMeter => "electric meter",
        }
    }

    pub fn interpreter(&self) -> InterpreterKind {
        match self {
            Self::Power | Self::Gas | Self::Water | Self::Heat => InterpreterKind::Meter,
            Self::PowerSensor
            | Self::Temperature
            | Self::Pressure
            | Self::Humidity
            | Self::Voltage
            | Self::Current => InterpreterKind::Sensor,
            Self::ElectricMeter => InterpreterKind::Accumulator,
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelType {
    type Err = MeteringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| MeteringError::Internal(format!("Unknown channel type '{}'", s)))
    }
}

/// Raw measurement: milliseconds since epoch and value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuple {
    pub timestamp: i64,
    pub value: f64,
}

impl Tuple {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Interpreter output; serialized as `[timestamp, value, count]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatedTuple {
    pub timestamp: i64,
    pub value: f64,
    /// Number of raw tuples folded into this one
    pub count: usize,
}

impl Serialize for AggregatedTuple {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.timestamp, self.value, self.count).serialize(serializer)
    }
}

/// Closed time range `[from, to]`; no upper bound when `to` is `None`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub from: i64,
    pub to: Option<i64>,
}

impl Interval {
    pub fn point(ts: i64) -> Self {
        Self { from: ts, to: Some(ts) }
    }

    pub fn contains(&self, ts: i64) -> bool {
        ts >= self.from && self.to.map_or(true, |to| ts <= to)
    }
}

/// Result of `add` and `delete`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowCount {
    pub rows: u64,
}

/// Query string accepted by the data endpoints. Everything stays a string
/// until the operation that needs it parses it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataQuery {
    pub options: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub tuples: Option<String>,
    pub group: Option<String>,
    pub ts: Option<String>,
    pub value: Option<String>,
}

fn non_empty(param: &Option<String>) -> Option<&str> {
    param.as_deref().filter(|s| !s.trim().is_empty())
}

impl DataQuery {
    pub fn options(&self) -> Option<&str> {
        non_empty(&self.options)
    }

    pub fn from(&self) -> Option<&str> {
        non_empty(&self.from)
    }

    pub fn to(&self) -> Option<&str> {
        non_empty(&self.to)
    }

    pub fn tuples(&self) -> Option<&str> {
        non_empty(&self.tuples)
    }

    pub fn group(&self) -> Option<&str> {
        non_empty(&self.group)
    }

    pub fn ts(&self) -> Option<&str> {
        non_empty(&self.ts)
    }

    pub fn value(&self) -> Option<&str> {
        non_empty(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_type_round_trip_names() {
        for t in ChannelType::ALL {
            assert_eq!(t.as_str().parse::<ChannelType>().unwrap(), t);
        }
        assert_eq!("Electric Meter".parse::<ChannelType>().unwrap(), ChannelType::ElectricMeter);
        assert!("toaster".parse::<ChannelType>().is_err());
    }

    #[test]
    fn test_channel_type_interpreters() {
        assert_eq!(ChannelType::Power.interpreter(), InterpreterKind::Meter);
        assert_eq!(ChannelType::Temperature.interpreter(), InterpreterKind::Sensor);
        assert_eq!(ChannelType::ElectricMeter.interpreter(), InterpreterKind::Accumulator);
    }

    #[test]
    fn test_aggregated_tuple_serializes_as_array() {
        let tuple = AggregatedTuple { timestamp: 1000, value: 2.5, count: 3 };
        assert_eq!(serde_json::to_string(&tuple).unwrap(), "[1000,2.5,3]");
    }

    #[test]
    fn test_interval_contains() {
        let open = Interval { from: 10, to: None };
        assert!(open.contains(10));
        assert!(open.contains(i64::MAX));
        assert!(!open.contains(9));

        let point = Interval::point(5);
        assert!(point.contains(5));
        assert!(!point.contains(6));
    }

    #[test]
    fn test_empty_query_params_are_absent() {
        let query = DataQuery {
            from: Some("".into()),
            ts: Some("  ".into()),
            value: Some("3".into()),
            ..Default::default()
        };
        assert_eq!(query.from(), None);
        assert_eq!(query.ts(), None);
        assert_eq!(query.value(), Some("3"));
    }
}
