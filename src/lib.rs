// Public library interface for interval-aggregator
pub mod aggregators;
pub mod cli_helper;
pub mod cli_utils;
pub mod csv_io;
pub mod utils;

// Re-export commonly used types
pub use aggregators::{
    AggregationError, AggregationPipeline, AggregationReport, AggregatorsConfig, IntervalKey,
    IntervalWidth, MeasurementSpec, RawRecord, SummaryRow,
};
