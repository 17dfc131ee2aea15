use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use crate::aggregators::error::{AggregationError, Result};
use crate::aggregators::records::{MeasurementSpec, SummaryRow};
use crate::aggregators::stats::SummaryStats;

/// `timestamp`, then `<label>_average, <label>_min, <label>_max, <label>_count`
/// per measurement in declared order
pub fn header(specs: &[MeasurementSpec]) -> Vec<String> {
    let mut header = Vec::with_capacity(1 + specs.len() * 4);
    header.push("timestamp".to_string());
    for spec in specs {
        header.push(format!("{}_average", spec.label));
        header.push(format!("{}_min", spec.label));
        header.push(format!("{}_max", spec.label));
        header.push(format!("{}_count", spec.label));
    }
    header
}

/// Cells for one row, no-data markers become empty cells
pub fn row_cells(row: &SummaryRow) -> Vec<String> {
    let mut cells = Vec::with_capacity(1 + row.measurements.len() * 4);
    cells.push(row.timestamp());
    for measurement in &row.measurements {
        cells.extend(stats_cells(&measurement.stats));
    }
    cells
}

fn stats_cells(stats: &SummaryStats) -> [String; 4] {
    [
        format_value(stats.average),
        format_value(stats.min),
        format_value(stats.max),
        stats.count.to_string(),
    ]
}

fn format_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes summary rows as CSV
pub struct SummaryWriter<W: io::Write> {
    writer: csv::Writer<W>,
}

impl SummaryWriter<File> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            writer: csv::Writer::from_path(path.as_ref())?,
        })
    }
}

impl<W: io::Write> SummaryWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes the header and every row, returns the number of rows written
    pub fn write_all(&mut self, specs: &[MeasurementSpec], rows: &[SummaryRow]) -> Result<usize> {
        self.writer.write_record(header(specs))?;
        for row in rows {
            self.writer.write_record(row_cells(row))?;
        }
        self.writer.flush()?;
        Ok(rows.len())
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| AggregationError::Io(e.into_error()))
    }
}

/// Writes summary rows as a pretty JSON array
pub fn write_json<W: io::Write>(sink: W, rows: &[SummaryRow]) -> Result<()> {
    serde_json::to_writer_pretty(sink, rows)?;
    Ok(())
}

/// `<dir>/<stem>_processed.csv` beside the input file
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_processed.csv", stem))
}
