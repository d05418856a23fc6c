//! Timestamp parsing shared by every request parameter and body field that
//! carries a point in time. All results are milliseconds since the Unix epoch (UTC).

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, Utc};
use metering_core::{MeteringError, Result};

const SECOND_MS: i64 = 1_000;
const MINUTE_MS: i64 = 60 * SECOND_MS;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;
const WEEK_MS: i64 = 7 * DAY_MS;

const NAIVE_DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const NAIVE_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d.%m.%Y"];

/// Current wall-clock time in milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Parse relative to the current time
pub fn parse_timestamp(input: &str) -> Result<i64> {
    parse_timestamp_at(input, Utc::now())
}

/// Parse `input`, resolving keywords and relative offsets against `now`.
pub fn parse_timestamp_at(input: &str, now: DateTime<Utc>) -> Result<i64> {
    let s = input.trim();
    if s.is_empty() {
        return Err(invalid(input));
    }

    if let Ok(ms) = s.parse::<i64>() {
        return Ok(ms);
    }
    if let Ok(ms) = s.parse::<f64>() {
        if ms.is_finite() && ms.abs() < i64::MAX as f64 {
            return Ok(ms.round() as i64);
        }
    }

    let lower = s.to_ascii_lowercase();
    let keyword = match lower.as_str() {
        "now" => Some(now.timestamp_millis()),
        "today" => midnight(now),
        "yesterday" => midnight(now).map(|ms| ms - DAY_MS),
        "tomorrow" => midnight(now).map(|ms| ms + DAY_MS),
        _ => None,
    };
    if let Some(ms) = keyword {
        return Ok(ms);
    }

    if let Some(ms) = parse_relative(&lower, now) {
        return Ok(ms);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp_millis());
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }
    for format in NAIVE_DATE_FORMATS {
        if let Some(dt) = NaiveDate::parse_from_str(s, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }

    Err(invalid(input))
}

fn invalid(input: &str) -> MeteringError {
    MeteringError::validation(format!("Invalid timestamp '{}'", input))
}

fn midnight(now: DateTime<Utc>) -> Option<i64> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// `[+|-]N unit[s] [ago]`, e.g. `-2 days` or `3 hours ago`
fn parse_relative(s: &str, now: DateTime<Utc>) -> Option<i64> {
    let mut parts = s.split_whitespace();
    let amount: i64 = parts.next()?.parse().ok()?;
    let unit = parts.next()?;
    let ago = match parts.next() {
        None => false,
        Some("ago") => true,
        Some(_) => return None,
    };
    if parts.next().is_some() {
        return None;
    }

    let amount = if ago { amount.checked_neg()? } else { amount };
    let unit = unit.strip_suffix('s').unwrap_or(unit);

    let fixed = match unit {
        "second" | "sec" => Some(SECOND_MS),
        "minute" | "min" => Some(MINUTE_MS),
        "hour" => Some(HOUR_MS),
        "day" => Some(DAY_MS),
        "week" => Some(WEEK_MS),
        _ => None,
    };
    if let Some(unit_ms) = fixed {
        return now.timestamp_millis().checked_add(amount.checked_mul(unit_ms)?);
    }

    let months = match unit {
        "month" => amount,
        "year" => amount.checked_mul(12)?,
        _ => return None,
    };
    let delta = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    let shifted = if months >= 0 {
        now.checked_add_months(delta)
    } else {
        now.checked_sub_months(delta)
    };
    shifted.map(|dt| dt.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 30, 0).unwrap()
    }

    fn parse(input: &str) -> Result<i64> {
        parse_timestamp_at(input, now())
    }

    fn ms(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap().timestamp_millis()
    }

    #[test]
    fn test_numeric_milliseconds() {
        assert_eq!(parse("1000").unwrap(), 1000);
        assert_eq!(parse(" -5 ").unwrap(), -5);
        assert_eq!(parse("1500.6").unwrap(), 1501);
        assert_eq!(parse("1e3").unwrap(), 1000);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(parse("now").unwrap(), now().timestamp_millis());
        assert_eq!(parse("NOW").unwrap(), now().timestamp_millis());
        assert_eq!(parse("today").unwrap(), ms(2024, 3, 15, 0, 0, 0));
        assert_eq!(parse("yesterday").unwrap(), ms(2024, 3, 14, 0, 0, 0));
        assert_eq!(parse("tomorrow").unwrap(), ms(2024, 3, 16, 0, 0, 0));
    }

    #[test]
    fn test_relative_offsets() {
        let base = now().timestamp_millis();
        assert_eq!(parse("-1 day").unwrap(), base - DAY_MS);
        assert_eq!(parse("+2 hours").unwrap(), base + 2 * HOUR_MS);
        assert_eq!(parse("3 minutes ago").unwrap(), base - 3 * MINUTE_MS);
        assert_eq!(parse("1 week").unwrap(), base + WEEK_MS);
        assert_eq!(parse("-1 month").unwrap(), ms(2024, 2, 15, 12, 30, 0));
        assert_eq!(parse("1 year ago").unwrap(), ms(2023, 3, 15, 12, 30, 0));
    }

    #[test]
    fn test_absolute_formats() {
        assert_eq!(parse("2024-01-02T03:04:05Z").unwrap(), ms(2024, 1, 2, 3, 4, 5));
        assert_eq!(parse("2024-01-02T03:04:05+01:00").unwrap(), ms(2024, 1, 2, 2, 4, 5));
        assert_eq!(parse("2024-01-02 03:04:05").unwrap(), ms(2024, 1, 2, 3, 4, 5));
        assert_eq!(parse("2024-01-02T03:04:05").unwrap(), ms(2024, 1, 2, 3, 4, 5));
        assert_eq!(parse("2024-01-02 03:04").unwrap(), ms(2024, 1, 2, 3, 4, 0));
        assert_eq!(parse("2024-01-02").unwrap(), ms(2024, 1, 2, 0, 0, 0));
        assert_eq!(parse("02.01.2024").unwrap(), ms(2024, 1, 2, 0, 0, 0));
    }

    #[test]
    fn test_rejects_garbage() {
        for input in ["", "   ", "soon", "1 fortnight", "-1 day later", "NaN", "inf", "2024-13-40"] {
            let err = parse(input).unwrap_err();
            assert!(matches!(err, MeteringError::Validation(_)), "{input:?} gave {err:?}");
        }
    }
}
