//! Local wall-clock timestamps.
//!
//! Every date/time in the store is a naive local time with minute precision,
//! stored as `YYYY-MM-DDTHH:mm`. No offsets, no UTC normalization: overdue and
//! "today" checks compare values in the same local frame they were written in.

use std::fmt;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::{Error, Result};

/// Canonical on-disk format
pub const STAMP_FORMAT: &str = "%Y-%m-%dT%H:%M";

const ACCEPTED_FORMATS: [&str; 4] = [
    STAMP_FORMAT,
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Source of "now" for the store.
pub trait Clock: fmt::Debug {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Reads the local system clock, truncated to the minute.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        truncate_to_minute(Local::now().naive_local())
    }
}

/// Always returns the same instant. Used by tests and reproducible tooling.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

pub fn truncate_to_minute(value: NaiveDateTime) -> NaiveDateTime {
    value
        .with_second(0)
        .and_then(|v| v.with_nanosecond(0))
        .unwrap_or(value)
}

pub fn format_stamp(value: &NaiveDateTime) -> String {
    value.format(STAMP_FORMAT).to_string()
}

/// Parse a timestamp in any accepted form. A bare date means midnight;
/// seconds are dropped.
pub fn parse_stamp(raw: &str) -> Result<NaiveDateTime> {
    let trimmed = raw.trim();
    for format in ACCEPTED_FORMATS {
        if let Ok(value) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(truncate_to_minute(value));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    Err(Error::InvalidArgument(format!(
        "invalid date/time '{trimmed}' (expected YYYY-MM-DDTHH:mm)"
    )))
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|err| {
        Error::InvalidArgument(format!("invalid date '{trimmed}' (expected YYYY-MM-DD): {err}"))
    })
}

/// Whole minutes from `start` to `end`, truncated toward zero.
pub fn minutes_between(start: &NaiveDateTime, end: &NaiveDateTime) -> i64 {
    (*end - *start).num_minutes()
}

/// Serde adapter for required timestamps.
pub mod stamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_stamp(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_stamp(&raw).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for optional timestamps.
pub mod stamp_opt {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_str(&super::format_stamp(value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|raw| super::parse_stamp(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn parses_canonical_and_lenient_forms() {
        assert_eq!(parse_stamp("2024-03-05T09:30").unwrap(), at(2024, 3, 5, 9, 30));
        assert_eq!(parse_stamp("2024-03-05T09:30:00").unwrap(), at(2024, 3, 5, 9, 30));
        assert_eq!(parse_stamp("2024-03-05 09:30").unwrap(), at(2024, 3, 5, 9, 30));
        assert_eq!(parse_stamp(" 2024-03-05 ").unwrap(), at(2024, 3, 5, 0, 0));
    }

    #[test]
    fn seconds_are_dropped() {
        assert_eq!(parse_stamp("2024-03-05T09:30:45").unwrap(), at(2024, 3, 5, 9, 30));
        assert_eq!(parse_stamp("2024-03-05 09:30:59").unwrap(), at(2024, 3, 5, 9, 30));
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_stamp("next tuesday").expect_err("should fail");
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn formats_without_seconds() {
        assert_eq!(format_stamp(&at(2024, 12, 31, 23, 59)), "2024-12-31T23:59");
    }

    #[test]
    fn minutes_truncate_toward_zero() {
        let start = at(2024, 1, 1, 10, 0);
        let end = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 45, 59)
            .unwrap();
        assert_eq!(minutes_between(&start, &end), 45);
        assert_eq!(minutes_between(&end, &start), -45);
    }

    #[test]
    fn system_clock_has_no_seconds() {
        let now = SystemClock.now();
        assert_eq!(now.second(), 0);
        assert_eq!(now.nanosecond(), 0);
    }
}
