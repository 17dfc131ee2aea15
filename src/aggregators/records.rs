use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::aggregators::error::AggregationError;
use crate::aggregators::interval::IntervalKey;
use crate::aggregators::stats::SummaryStats;

/// Which column feeds which measurement label
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MeasurementSpec {
    pub label: String,
    #[serde(alias = "column")]
    pub source_column: usize,
}

impl MeasurementSpec {
    pub fn new(label: impl Into<String>, source_column: usize) -> Self {
        Self {
            label: label.into(),
            source_column,
        }
    }
}

impl fmt::Display for MeasurementSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.label, self.source_column)
    }
}

/// Parses `label=column`, as given on the command line
impl FromStr for MeasurementSpec {
    type Err = AggregationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (label, column) = s.rsplit_once('=').ok_or_else(|| {
            AggregationError::invalid_configuration(format!(
                "measurement '{}' must look like label=column",
                s
            ))
        })?;

        let source_column = column.trim().parse::<usize>().map_err(|_| {
            AggregationError::invalid_configuration(format!(
                "measurement '{}' has an invalid column index '{}'",
                s, column
            ))
        })?;

        Ok(Self::new(label.trim(), source_column))
    }
}

/// One timestamped input row, cells keyed by zero-based column index
#[derive(Clone, Debug, PartialEq)]
pub struct RawRecord {
    pub position: u64,
    pub timestamp: NaiveDateTime,
    pub values: BTreeMap<usize, String>,
}

impl RawRecord {
    pub fn new(position: u64, timestamp: NaiveDateTime, values: BTreeMap<usize, String>) -> Self {
        Self {
            position,
            timestamp,
            values,
        }
    }

    /// Builds a record from a row's cells in column order
    pub fn from_cells<I, S>(position: u64, timestamp: NaiveDateTime, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = cells
            .into_iter()
            .enumerate()
            .map(|(column, cell)| (column, cell.into()))
            .collect();
        Self::new(position, timestamp, values)
    }

    pub fn value(&self, column: usize) -> Option<&str> {
        self.values.get(&column).map(String::as_str)
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct LabeledStats {
    pub label: String,
    #[serde(flatten)]
    pub stats: SummaryStats,
}

/// Output row: one interval with the reduced stats of every measurement, in
/// declared order
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SummaryRow {
    pub interval: IntervalKey,
    pub measurements: Vec<LabeledStats>,
}

impl SummaryRow {
    pub fn stats_for(&self, label: &str) -> Option<&SummaryStats> {
        self.measurements
            .iter()
            .find(|m| m.label == label)
            .map(|m| &m.stats)
    }

    /// Interval end rendered for output, e.g. `2013-12-08T01:15:00+00:00`
    pub fn timestamp(&self) -> String {
        self.interval.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurement_spec_from_str() {
        let spec: MeasurementSpec = "temp=3".parse().unwrap();
        assert_eq!(spec, MeasurementSpec::new("temp", 3));

        let spaced: MeasurementSpec = " flow rate = 12 ".parse().unwrap();
        assert_eq!(spaced, MeasurementSpec::new("flow rate", 12));

        assert!("temp".parse::<MeasurementSpec>().is_err());
        assert!("temp=-1".parse::<MeasurementSpec>().is_err());
        assert!("temp=x".parse::<MeasurementSpec>().is_err());
    }

    #[test]
    fn test_measurement_spec_accepts_column_alias() {
        let spec: MeasurementSpec =
            serde_json::from_str(r#"{"label": "kw", "column": 2}"#).unwrap();
        assert_eq!(spec, MeasurementSpec::new("kw", 2));
    }

    #[test]
    fn test_raw_record_from_cells() {
        let ts = NaiveDateTime::parse_from_str("2013-12-08 01:02:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let record = RawRecord::from_cells(4, ts, ["12/8/13 1:02", "10.5", ""]);

        assert_eq!(record.value(1), Some("10.5"));
        assert_eq!(record.value(2), Some(""));
        assert_eq!(record.value(3), None);
    }

    #[test]
    fn test_summary_row_lookup_and_json_shape() {
        let row = SummaryRow {
            interval: IntervalKey::from_epoch_seconds(900),
            measurements: vec![LabeledStats {
                label: "temp".to_string(),
                stats: SummaryStats::empty(),
            }],
        };

        assert_eq!(row.stats_for("temp").map(|s| s.count), Some(0));
        assert!(row.stats_for("missing").is_none());

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["interval"], "1970-01-01T00:15:00+00:00");
        assert_eq!(json["measurements"][0]["label"], "temp");
        assert!(json["measurements"][0]["average"].is_null());
        assert_eq!(json["measurements"][0]["count"], 0);
    }
}
