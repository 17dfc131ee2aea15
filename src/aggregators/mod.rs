pub mod accumulator;
pub mod config;
pub mod error;
pub mod interval;
pub mod processor;
pub mod records;
pub mod stats;

// Re-export commonly used types
pub use accumulator::GroupAccumulator;
pub use config::{AggregatorsConfig, RecordPolicy};
pub use error::{AggregationError, Result};
pub use interval::{assign, IntervalKey, IntervalWidth};
pub use processor::{AggregationPipeline, AggregationReport};
pub use records::{LabeledStats, MeasurementSpec, RawRecord, SummaryRow};
pub use stats::{reduce, SummaryStats};
