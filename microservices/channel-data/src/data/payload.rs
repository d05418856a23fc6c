//! Normalization of `add` submissions into (timestamp, value) pairs.
//!
//! A JSON body of `[timestamp, value]` records is tried first. If the body is
//! empty or not JSON at all the `ts`/`value` query parameters supply one tuple.
//! JSON of the wrong shape is rejected, never replaced by the fallback.

use metering_core::{MeteringError, Result};
use serde_json::{Number, Value};
use thiserror::Error;
use tracing::debug;

use crate::timestamp;
use crate::types::Tuple;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Can only add data for a single channel at a time")]
    MultiChannel,

    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("Invalid payload: {0}")]
    Invalid(String),
}

/// Which of the two submission formats produced the tuples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Structured,
    Legacy,
}

/// Normalize a submission. An empty or unparsable body falls back to the
/// query parameters; every other failure is a validation error.
pub fn normalize(body: &[u8], ts: Option<&str>, value: Option<&str>) -> Result<(Vec<Tuple>, Submission)> {
    match parse_structured(body) {
        Ok(tuples) => Ok((tuples, Submission::Structured)),
        Err(err @ (PayloadError::MultiChannel | PayloadError::Invalid(_))) => {
            Err(MeteringError::validation(err.to_string()))
        }
        Err(PayloadError::Malformed(reason)) => {
            debug!(%reason, "Falling back to ts/value parameters");
            Ok((vec![parse_legacy(ts, value)?], Submission::Legacy))
        }
    }
}

/// Body as a JSON array of `[timestamp, value, ...]` records, flattened in order
pub fn parse_structured(body: &[u8]) -> std::result::Result<Vec<Tuple>, PayloadError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(PayloadError::Malformed("empty body".to_string()));
    }

    let json: Value = serde_json::from_slice(body).map_err(|e| PayloadError::Malformed(e.to_string()))?;
    let records = match json {
        Value::Object(map) if map.contains_key("data") => return Err(PayloadError::MultiChannel),
        Value::Array(records) => records,
        _ => return Err(PayloadError::Invalid("expected an array of tuples".to_string())),
    };

    records
        .iter()
        .enumerate()
        .map(|(index, record)| parse_record(index, record))
        .collect()
}

fn parse_record(index: usize, record: &Value) -> std::result::Result<Tuple, PayloadError> {
    let invalid = |what: &str| PayloadError::Invalid(format!("tuple {}: {}", index, what));

    let fields = record
        .as_array()
        .filter(|fields| fields.len() >= 2)
        .ok_or_else(|| invalid("expected [timestamp, value]"))?;

    let timestamp = match &fields[0] {
        Value::Number(n) => number_to_millis(n),
        Value::String(s) => timestamp::parse_timestamp(s).ok(),
        _ => None,
    }
    .ok_or_else(|| invalid("invalid timestamp"))?;

    let value = match &fields[1] {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
    .ok_or_else(|| invalid("invalid value"))?;

    Ok(Tuple::new(timestamp, value))
}

fn number_to_millis(n: &Number) -> Option<i64> {
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
            .map(|f| f.round() as i64)
    })
}

/// One tuple from query parameters; `ts` defaults to now and `value` to 1
pub fn parse_legacy(ts: Option<&str>, value: Option<&str>) -> Result<Tuple> {
    let timestamp = match ts {
        Some(ts) => timestamp::parse_timestamp(ts)?,
        None => timestamp::now_millis(),
    };

    let value = match value {
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| MeteringError::validation(format!("Invalid value '{}'", raw)))?,
        None => 1.0,
    };

    Ok(Tuple::new(timestamp, value))
}
