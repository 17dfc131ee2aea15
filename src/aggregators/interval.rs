use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregators::error::{AggregationError, Result};

/// Shift applied before bucketing so a reading stamped exactly on a boundary
/// stays in the interval that ends there (01:15:00 -> 01:15, not 01:30).
/// For minute-resolution input this buckets identically to a one minute shift.
const BOUNDARY_SHIFT_SECS: i64 = 1;

pub const DEFAULT_WIDTH_MINUTES: i64 = 15;

/// Validated bucket width, in whole minutes
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(try_from = "IntervalWidthRepr", into = "i64")]
pub struct IntervalWidth {
    minutes: i64,
}

impl IntervalWidth {
    pub fn new(minutes: i64) -> Result<Self> {
        if minutes <= 0 {
            return Err(AggregationError::invalid_configuration(format!(
                "interval width must be at least 1 minute, got {}",
                minutes
            )));
        }
        if minutes.checked_mul(60).is_none() {
            return Err(AggregationError::invalid_configuration(format!(
                "interval width of {} minutes overflows when converted to seconds",
                minutes
            )));
        }
        Ok(Self { minutes })
    }

    pub fn minutes(&self) -> i64 {
        self.minutes
    }

    pub fn seconds(&self) -> i64 {
        self.minutes * 60
    }

    /// Maps a timestamp to the key of the interval ending at or after it.
    ///
    /// Readings in `(end - width, end]` belong to `end`. Floor division keeps
    /// the rule intact for instants before 1970.
    pub fn assign(&self, timestamp: NaiveDateTime) -> IntervalKey {
        let width_secs = self.seconds();
        let shifted = timestamp.and_utc().timestamp() - BOUNDARY_SHIFT_SECS;
        let bucket_index = shifted.div_euclid(width_secs) + 1;
        // |bucket_index * width| <= |shifted| + width: never saturates in chrono's range
        IntervalKey(bucket_index.saturating_mul(width_secs))
    }
}

impl Default for IntervalWidth {
    fn default() -> Self {
        Self {
            minutes: DEFAULT_WIDTH_MINUTES,
        }
    }
}

impl fmt::Display for IntervalWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minutes {
            m if m % (7 * 24 * 60) == 0 => write!(f, "{}week", m / (7 * 24 * 60)),
            m if m % (24 * 60) == 0 => write!(f, "{}day", m / (24 * 60)),
            m if m % 60 == 0 => write!(f, "{}hr", m / 60),
            m => write!(f, "{}min", m),
        }
    }
}

/// Accepts plain minute counts ("15") or shorthand such as "5min", "1hr",
/// "4hr", "1day" and "1week".
impl FromStr for IntervalWidth {
    type Err = AggregationError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim().to_lowercase();
        let split = raw
            .find(|c: char| !(c.is_ascii_digit() || c == '-'))
            .unwrap_or(raw.len());
        let (amount, unit) = raw.split_at(split);

        let amount: i64 = amount.parse().map_err(|_| {
            AggregationError::invalid_configuration(format!("invalid interval width '{}'", s))
        })?;

        let multiplier = match unit.trim() {
            "" | "m" | "min" | "mins" | "minute" | "minutes" => 1,
            "h" | "hr" | "hrs" | "hour" | "hours" => 60,
            "d" | "day" | "days" => 24 * 60,
            "w" | "week" | "weeks" => 7 * 24 * 60,
            other => {
                return Err(AggregationError::invalid_configuration(format!(
                    "unknown interval unit '{}' in '{}'",
                    other, s
                )));
            }
        };

        let minutes = amount.checked_mul(multiplier).ok_or_else(|| {
            AggregationError::invalid_configuration(format!("interval width '{}' is too large", s))
        })?;
        Self::new(minutes)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntervalWidthRepr {
    Minutes(i64),
    Named(String),
}

impl TryFrom<IntervalWidthRepr> for IntervalWidth {
    type Error = AggregationError;

    fn try_from(repr: IntervalWidthRepr) -> Result<Self> {
        match repr {
            IntervalWidthRepr::Minutes(minutes) => IntervalWidth::new(minutes),
            IntervalWidthRepr::Named(name) => name.parse(),
        }
    }
}

impl From<IntervalWidth> for i64 {
    fn from(width: IntervalWidth) -> i64 {
        width.minutes
    }
}

/// End boundary of an interval, in seconds since the Unix epoch (UTC)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IntervalKey(i64);

impl IntervalKey {
    pub fn from_epoch_seconds(seconds: i64) -> Self {
        Self(seconds)
    }

    pub fn epoch_seconds(&self) -> i64 {
        self.0
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.0, 0)
    }
}

impl fmt::Display for IntervalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::Secs, false)),
            None => write!(f, "{}", self.0),
        }
    }
}

impl Serialize for IntervalKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Assigns `timestamp` to its interval for a width given in minutes
pub fn assign(timestamp: NaiveDateTime, interval_width_minutes: i64) -> Result<IntervalKey> {
    Ok(IntervalWidth::new(interval_width_minutes)?.assign(timestamp))
}
