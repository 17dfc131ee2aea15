use std::fs::File;
use std::io;
use std::path::Path;

use chrono::{Datelike, NaiveDateTime};
use csv::{ErrorKind, ReaderBuilder, StringRecord, Trim};

use crate::aggregators::config::{AggregatorsConfig, DEFAULT_TIMESTAMP_FORMAT};
use crate::aggregators::error::{AggregationError, Result};
use crate::aggregators::records::{MeasurementSpec, RawRecord};

/// Tried in order when the default format does not match. A custom format is
/// never second-guessed.
const FALLBACK_TIMESTAMP_FORMATS: &[&str] = &[
    "%m/%d/%y %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Fallback parses landing before this year came from a two-digit year
const MIN_FALLBACK_YEAR: i32 = 100;

/// Streams CSV rows as timestamped records.
///
/// Yields one `Result` per row: a timestamp that is missing or unparsable, or
/// a row the CSV layer cannot decode, becomes `InvalidRecord` naming the
/// source line, leaving the skip/abort decision to the pipeline.
pub struct RecordReader<R: io::Read> {
    reader: csv::Reader<R>,
    timestamp_column: usize,
    timestamp_format: String,
    row: StringRecord,
    rows_read: u64,
}

impl RecordReader<File> {
    pub fn from_path(path: impl AsRef<Path>, config: &AggregatorsConfig) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self::from_reader(file, config))
    }
}

impl<R: io::Read> RecordReader<R> {
    pub fn from_reader(source: R, config: &AggregatorsConfig) -> Self {
        let reader = ReaderBuilder::new()
            .has_headers(config.has_headers)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(source);

        Self {
            reader,
            timestamp_column: config.timestamp_column,
            timestamp_format: config.timestamp_format.clone(),
            row: StringRecord::new(),
            rows_read: 0,
        }
    }

    /// Header cells, if the source has a header row
    pub fn headers(&mut self) -> Result<Option<Vec<String>>> {
        if !self.reader.has_headers() {
            return Ok(None);
        }
        let headers = self.reader.headers()?;
        Ok(Some(headers.iter().map(str::to_string).collect()))
    }

    /// Measurements whose column lies past the last header cell. Always empty
    /// for headerless input.
    pub fn columns_past_header<'a>(&mut self, specs: &'a [MeasurementSpec]) -> Result<Vec<&'a MeasurementSpec>> {
        let width = match self.headers()? {
            Some(headers) => headers.len(),
            None => return Ok(Vec::new()),
        };
        Ok(specs.iter().filter(|spec| spec.source_column >= width).collect())
    }

    fn to_record(&self, position: u64) -> Result<RawRecord> {
        let cell = self
            .row
            .get(self.timestamp_column)
            .filter(|cell| !cell.is_empty())
            .ok_or_else(|| {
                AggregationError::invalid_record(
                    position,
                    format!("no timestamp in column {}", self.timestamp_column),
                )
            })?;

        let timestamp = parse_timestamp(cell, &self.timestamp_format).ok_or_else(|| {
            AggregationError::invalid_record(
                position,
                format!(
                    "timestamp '{}' does not match format '{}'",
                    cell, self.timestamp_format
                ),
            )
        })?;

        Ok(RawRecord::from_cells(position, timestamp, self.row.iter()))
    }
}

impl<R: io::Read> Iterator for RecordReader<R> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.row) {
            Ok(false) => None,
            Ok(true) => {
                self.rows_read += 1;
                let position = self
                    .row
                    .position()
                    .map(|p| p.line())
                    .unwrap_or(self.rows_read);
                Some(self.to_record(position))
            }
            Err(e) if is_row_error(&e) => {
                self.rows_read += 1;
                let position = e.position().map(|p| p.line()).unwrap_or(self.rows_read);
                Some(Err(AggregationError::invalid_record(position, e.to_string())))
            }
            Err(e) => Some(Err(e.into())),
        }
    }
}

/// Errors confined to one row; the reader can carry on past them
fn is_row_error(err: &csv::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::Utf8 { .. } | ErrorKind::UnequalLengths { .. }
    )
}

/// Parses with `format`. Only the default format falls back to common
/// date-time layouts.
pub fn parse_timestamp(raw: &str, format: &str) -> Option<NaiveDateTime> {
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, format) {
        return Some(timestamp);
    }
    if format != DEFAULT_TIMESTAMP_FORMAT {
        return None;
    }
    FALLBACK_TIMESTAMP_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .find(|timestamp| timestamp.year() >= MIN_FALLBACK_YEAR)
}
