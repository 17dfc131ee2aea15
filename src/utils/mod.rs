pub mod app_config;

pub use app_config::{AggregatorArgs, AppConfig, OutputFormat};
