//! Bucketing of raw tuples before an interpreter folds each bucket

use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use metering_core::MeteringError;
use serde::Serialize;
use std::str::FromStr;

use crate::types::Tuple;

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Calendar unit used by `?group=`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl FromStr for GroupBy {
    type Err = MeteringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minute" => Ok(Self::Minute),
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            _ => Err(MeteringError::validation(format!("Unknown group '{}'", s))),
        }
    }
}

impl GroupBy {
    /// Start (UTC, ms) of the unit containing `ts`; weeks start on Monday
    pub fn bucket_start(&self, ts: i64) -> Option<i64> {
        match self {
            Self::Minute => Some(ts.div_euclid(MINUTE_MS) * MINUTE_MS),
            Self::Hour => Some(ts.div_euclid(HOUR_MS) * HOUR_MS),
            Self::Day => Some(ts.div_euclid(DAY_MS) * DAY_MS),
            Self::Week => {
                // 1970-01-01 was a Thursday
                let day = ts.div_euclid(DAY_MS);
                let since_monday = (day + 3).rem_euclid(7);
                Some((day - since_monday) * DAY_MS)
            }
            Self::Month | Self::Year => {
                let dt = Utc.timestamp_millis_opt(ts).single()?;
                let month = if *self == Self::Month { dt.month() } else { 1 };
                let start = NaiveDate::from_ymd_opt(dt.year(), month, 1)?.and_hms_opt(0, 0, 0)?;
                Some(start.and_utc().timestamp_millis())
            }
        }
    }
}

/// Split time-ordered `raw` tuples into consecutive buckets.
///
/// `group` wins over `tuples`. Without either every tuple is its own bucket.
pub fn buckets(raw: &[Tuple], group: Option<GroupBy>, tuples: Option<usize>) -> Vec<&[Tuple]> {
    if raw.is_empty() {
        return Vec::new();
    }

    if let Some(group) = group {
        let key = |t: &Tuple| group.bucket_start(t.timestamp).unwrap_or(t.timestamp);
        let mut out = Vec::new();
        let mut start = 0;
        for i in 1..raw.len() {
            if key(&raw[i]) != key(&raw[start]) {
                out.push(&raw[start..i]);
                start = i;
            }
        }
        out.push(&raw[start..]);
        return out;
    }

    match tuples {
        Some(n) if n > 0 && raw.len() > n => raw.chunks(raw.len().div_ceil(n)).collect(),
        _ => raw.chunks(1).collect(),
    }
}
