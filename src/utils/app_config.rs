use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use crate::aggregators::config::{AggregatorsConfig, RecordPolicy};
use crate::aggregators::interval::IntervalWidth;
use crate::aggregators::records::MeasurementSpec;
use crate::csv_io::default_output_path;

/// Output path meaning "write to stdout"
pub const STDOUT_PATH: &str = "-";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// CSV file, one row per interval
    #[default]
    #[value(name = "csv")]
    Csv,
    /// Pretty JSON array
    #[value(name = "json")]
    Json,
    /// Aligned table on stdout
    #[value(name = "table")]
    Table,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "interval-aggregator",
    about = "Rolls timestamped CSV measurements up into fixed-width intervals",
    long_about = "Groups every measurement into the interval ending at or after its timestamp \
                  (01:00:01-01:15:00 belongs to 01:15:00) and writes average, min, max and count per interval"
)]
pub struct AggregatorArgs {
    /// CSV file to aggregate (prompted for when omitted)
    #[arg(long, short, env = "AGGREGATOR_INPUT")]
    pub input: Option<PathBuf>,

    /// Output file, defaults to <input>_processed.csv; "-" for stdout
    #[arg(long, short, env = "AGGREGATOR_OUTPUT")]
    pub output: Option<PathBuf>,

    /// JSON file with interval, measurements and parsing options
    #[arg(long, env = "AGGREGATOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Interval width in minutes, or shorthand such as 5min, 1hr, 1day
    #[arg(long, env = "AGGREGATOR_INTERVAL")]
    pub interval: Option<IntervalWidth>,

    /// Measurement to aggregate as label=column (zero-based), repeatable
    #[arg(long = "measurement", short = 'm', value_name = "LABEL=COLUMN")]
    pub measurements: Vec<MeasurementSpec>,

    /// Column holding the timestamp
    #[arg(long, env = "AGGREGATOR_TIMESTAMP_COLUMN")]
    pub timestamp_column: Option<usize>,

    /// chrono format of the timestamp column
    #[arg(long, env = "AGGREGATOR_TIMESTAMP_FORMAT")]
    pub timestamp_format: Option<String>,

    /// What to do with rows that fail to parse
    #[arg(long, value_enum, env = "AGGREGATOR_ON_ERROR")]
    pub on_error: Option<RecordPolicy>,

    /// Treat the first row as data
    #[arg(long)]
    pub no_headers: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "csv")]
    pub format: OutputFormat,

    /// Prompt for the file and measurements even if given
    #[arg(long)]
    pub interactive: bool,
}

/// Resolved settings for one invocation of the tool
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    pub aggregation: AggregatorsConfig,
}

impl AppConfig {
    pub fn new(input: Option<PathBuf>, aggregation: AggregatorsConfig) -> Self {
        Self {
            input,
            output: None,
            format: OutputFormat::default(),
            aggregation,
        }
    }

    /// Layers flags and env vars over the config file over defaults
    pub fn from_args(args: &AggregatorArgs) -> Result<Self> {
        let mut aggregation = match &args.config {
            Some(path) => AggregatorsConfig::from_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => AggregatorsConfig::default(),
        };

        if let Some(interval) = args.interval {
            aggregation.interval = interval;
        }
        if !args.measurements.is_empty() {
            aggregation.measurements = args.measurements.clone();
        }
        if let Some(column) = args.timestamp_column {
            aggregation.timestamp_column = column;
        }
        if let Some(format) = &args.timestamp_format {
            aggregation.timestamp_format = format.clone();
        }
        if let Some(policy) = args.on_error {
            aggregation.on_error = policy;
        }
        if args.no_headers {
            aggregation.has_headers = false;
        }

        Ok(Self {
            input: args.input.clone(),
            output: args.output.clone(),
            format: args.format,
            aggregation,
        })
    }

    /// Whether the interactive prompts have anything to fill in
    pub fn needs_prompt(&self) -> bool {
        self.input.is_none() || self.aggregation.measurements.is_empty()
    }

    /// Where results go; `None` means stdout
    pub fn output_path(&self) -> Option<PathBuf> {
        match &self.output {
            Some(path) if path.as_os_str() == STDOUT_PATH => None,
            Some(path) => Some(path.clone()),
            None => match (self.format, &self.input) {
                (OutputFormat::Csv, Some(input)) => Some(default_output_path(input)),
                _ => None,
            },
        }
    }
}

/// Adds `.csv` to a bare file name, as typed at the prompt
pub fn resolve_input(name: &str) -> PathBuf {
    let path = Path::new(name.trim());
    if path.extension().is_none() {
        path.with_extension("csv")
    } else {
        path.to_path_buf()
    }
}
