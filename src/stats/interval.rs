//! Interval granularity and interval identifiers.
//!
//! An interval identifier names one UTC interval at a given granularity:
//!
//! | Granularity | Format              | Example            |
//! |-------------|---------------------|--------------------|
//! | minute      | `yyyy-MM-dd:HH:mm`  | `2024-03-07:14:05` |
//! | hour        | `yyyy-MM-dd:HH`     | `2024-03-07:14`    |
//! | day         | `yyyy-MM-dd`        | `2024-03-07`       |
//! | month       | `yyyy-MM`           | `2024-03`          |

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime, TimeDelta, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

const MINUTE_FORMAT: &str = "%Y-%m-%d:%H:%M";

/// Aggregation granularity of statistics records.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One-minute intervals.
    #[default]
    Minute,
    /// One-hour intervals.
    Hour,
    /// One-day intervals.
    Day,
    /// Calendar-month intervals.
    Month,
}

impl Granularity {
    /// Returns the lowercase name used in query parameters.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Month => "month",
        }
    }

    const fn format(self) -> &'static str {
        match self {
            Self::Minute => MINUTE_FORMAT,
            Self::Hour => "%Y-%m-%d:%H",
            Self::Day => "%Y-%m-%d",
            Self::Month => "%Y-%m",
        }
    }

    /// Returns the interval identifier of the interval containing `time`.
    #[must_use]
    pub fn interval_id(self, time: DateTime<Utc>) -> String {
        time.format(self.format()).to_string()
    }

    /// Returns the interval identifier for a Unix timestamp in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidIntervalId`] if `millis` is out of the
    /// representable range.
    pub fn interval_id_at_millis(self, millis: i64) -> Result<String> {
        DateTime::from_timestamp_millis(millis)
            .map(|time| self.interval_id(time))
            .ok_or_else(|| ClientError::InvalidIntervalId(format!("timestamp {millis}")))
    }

    /// Returns the start of the interval containing `time`.
    #[must_use]
    pub fn truncate(self, time: DateTime<Utc>) -> DateTime<Utc> {
        let naive = time.naive_utc();
        let date = naive.date();
        let start = match self {
            Self::Minute => date.and_hms_opt(naive.hour(), naive.minute(), 0),
            Self::Hour => date.and_hms_opt(naive.hour(), 0, 0),
            Self::Day => date.and_hms_opt(0, 0, 0),
            Self::Month => date.with_day(1).and_then(|d| d.and_hms_opt(0, 0, 0)),
        };
        start.map_or(time, |naive| naive.and_utc())
    }

    /// Returns the start of the interval following the one starting at `start`.
    #[must_use]
    pub fn next_start(self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Minute => start.checked_add_signed(TimeDelta::minutes(1)),
            Self::Hour => start.checked_add_signed(TimeDelta::hours(1)),
            Self::Day => start.checked_add_signed(TimeDelta::days(1)),
            Self::Month => start.checked_add_months(Months::new(1)),
        }
    }

    /// Returns the start of the interval preceding the one starting at `start`.
    #[must_use]
    pub fn previous_start(self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Minute => start.checked_sub_signed(TimeDelta::minutes(1)),
            Self::Hour => start.checked_sub_signed(TimeDelta::hours(1)),
            Self::Day => start.checked_sub_signed(TimeDelta::days(1)),
            Self::Month => start.checked_sub_months(Months::new(1)),
        }
    }

    /// Parses `id` as an interval identifier of this granularity, returning
    /// the interval's start.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidIntervalId`] if `id` does not match the
    /// granularity's format.
    pub fn parse_interval_id(self, id: &str) -> Result<DateTime<Utc>> {
        let invalid = || ClientError::InvalidIntervalId(id.to_string());
        let naive = match self {
            Self::Minute => NaiveDateTime::parse_from_str(id, MINUTE_FORMAT).ok(),
            Self::Hour => NaiveDateTime::parse_from_str(&format!("{id}:00"), MINUTE_FORMAT).ok(),
            Self::Day => NaiveDate::parse_from_str(id, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
            Self::Month => NaiveDate::parse_from_str(&format!("{id}-01"), "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
        };
        naive.map(|n| n.and_utc()).ok_or_else(invalid)
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "minute" => Ok(Self::Minute),
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "month" => Ok(Self::Month),
            other => Err(ClientError::invalid_param(
                "unit",
                format!("expected minute, hour, day or month, got `{other}`"),
            )),
        }
    }
}

/// A parsed interval identifier of any granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    /// Granularity inferred from the identifier's shape.
    pub granularity: Granularity,
    /// Inclusive start of the interval.
    pub start: DateTime<Utc>,
}

impl Interval {
    /// Parses an identifier, inferring its granularity from its length.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidIntervalId`] if `id` matches no format.
    pub fn parse(id: &str) -> Result<Self> {
        let granularity = match id.len() {
            16 => Granularity::Minute,
            13 => Granularity::Hour,
            10 => Granularity::Day,
            7 => Granularity::Month,
            _ => return Err(ClientError::InvalidIntervalId(id.to_string())),
        };
        let start = granularity.parse_interval_id(id)?;
        Ok(Self { granularity, start })
    }

    /// Exclusive end of the interval.
    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.granularity
            .next_start(self.start)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
