//! Time ranges from `from`/`to`/`ts` query parameters

use metering_core::{MeteringError, Result};

use crate::timestamp::parse_timestamp;
use crate::types::Interval;

/// Interval for `delete`.
///
/// `from` (optionally bounded by `to`) takes precedence over `ts`, which
/// selects a single point. A request with neither is rejected.
pub fn delete_interval(from: Option<&str>, to: Option<&str>, ts: Option<&str>) -> Result<Interval> {
    if let Some(from) = from {
        let from = parse_timestamp(from)?;
        let to = to.map(parse_timestamp).transpose()?;
        if let Some(to) = to {
            check_order(from, to)?;
        }
        return Ok(Interval { from, to });
    }

    if let Some(ts) = ts {
        return Ok(Interval::point(parse_timestamp(ts)?));
    }

    Err(MeteringError::validation("Missing timestamp (ts, from, to)"))
}

/// Optional read bounds for `get`
pub fn query_range(from: Option<&str>, to: Option<&str>) -> Result<(Option<i64>, Option<i64>)> {
    let from = from.map(parse_timestamp).transpose()?;
    let to = to.map(parse_timestamp).transpose()?;
    if let (Some(from), Some(to)) = (from, to) {
        check_order(from, to)?;
    }
    Ok((from, to))
}

fn check_order(from: i64, to: i64) -> Result<()> {
    if from > to {
        return Err(MeteringError::validation(format!("From ({}) is larger than to ({})", from, to)));
    }
    Ok(())
}
