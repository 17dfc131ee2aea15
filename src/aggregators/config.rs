use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::aggregators::error::{AggregationError, Result};
use crate::aggregators::interval::IntervalWidth;
use crate::aggregators::records::MeasurementSpec;

pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%m/%d/%y %H:%M";

/// What to do with a record that fails to parse
#[derive(Serialize, Deserialize, ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RecordPolicy {
    /// Abort the run on the first bad record
    #[default]
    #[value(name = "fail-fast")]
    FailFast,
    /// Drop the whole record, log a warning and keep going
    #[value(name = "skip")]
    Skip,
}

impl fmt::Display for RecordPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordPolicy::FailFast => write!(f, "fail-fast"),
            RecordPolicy::Skip => write!(f, "skip"),
        }
    }
}

/// Configuration for one aggregation run
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AggregatorsConfig {
    /// Bucket width
    pub interval: IntervalWidth,
    /// Measurements to aggregate, in output column order
    pub measurements: Vec<MeasurementSpec>,
    /// Policy for per-record failures
    pub on_error: RecordPolicy,
    /// Column holding the timestamp
    pub timestamp_column: usize,
    /// chrono format string for the timestamp column
    pub timestamp_format: String,
    /// Whether the first input row is a header
    pub has_headers: bool,
}

impl Default for AggregatorsConfig {
    fn default() -> Self {
        Self {
            interval: IntervalWidth::default(),
            measurements: Vec::new(),
            on_error: RecordPolicy::default(),
            timestamp_column: 0,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            has_headers: true,
        }
    }
}

impl AggregatorsConfig {
    pub fn new(interval: IntervalWidth, measurements: Vec<MeasurementSpec>) -> Self {
        Self {
            interval,
            measurements,
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, on_error: RecordPolicy) -> Self {
        self.on_error = on_error;
        self
    }

    /// Loads a JSON config file; omitted fields keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: AggregatorsConfig = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Rejects configurations that cannot produce a meaningful run
    pub fn validate(&self) -> Result<()> {
        if self.measurements.is_empty() {
            return Err(AggregationError::invalid_configuration(
                "at least one measurement is required",
            ));
        }

        let mut seen = HashSet::new();
        for spec in &self.measurements {
            if spec.label.trim().is_empty() {
                return Err(AggregationError::invalid_configuration(format!(
                    "measurement in column {} has an empty label",
                    spec.source_column
                )));
            }
            if !seen.insert(spec.label.as_str()) {
                return Err(AggregationError::invalid_configuration(format!(
                    "duplicate measurement label '{}'",
                    spec.label
                )));
            }
        }

        if self.timestamp_format.trim().is_empty() {
            return Err(AggregationError::invalid_configuration(
                "timestamp format must not be empty",
            ));
        }

        Ok(())
    }
}
