use anyhow::Result;
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

use crate::aggregators::records::MeasurementSpec;
use crate::cli_utils::{confirm, print_header, print_warning, CliError, Input};
use crate::utils::app_config::{resolve_input, AppConfig};

/// Loads `.env` if present and installs the stderr log subscriber
pub fn initialize_environment() {
    let _ = dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Asks for whatever the flags and config file left out: the data file, then
/// each measurement's label and column.
pub fn prompt_for_missing(mut app_config: AppConfig) -> Result<AppConfig> {
    print_header("Interactive setup");

    while app_config.input.is_none() {
        let name = Input::get_string("Name of the data file to process (.csv)")?;
        let path = resolve_input(&name);
        if path.is_file() {
            app_config.input = Some(path);
        } else {
            print_warning(&format!("{} does not exist", path.display()));
        }
    }

    if app_config.aggregation.measurements.is_empty() {
        app_config.aggregation.timestamp_column = Input::get_usize_or(
            "Which column holds the timestamp? (1st column is 0)",
            app_config.aggregation.timestamp_column,
        )?;

        let count = Input::get_usize("How many measurements do you want to process?")?;
        if count == 0 {
            return Err(CliError::ValidationError("at least one measurement is required".to_string()).into());
        }

        for n in 1..=count {
            let label = Input::get_string(&format!("Name of measurement {}", n))?;
            let column = Input::get_usize(&format!("Which column is {} in? (1st column is 0)", label))?;
            app_config
                .aggregation
                .measurements
                .push(MeasurementSpec::new(label, column));
        }
    }

    Ok(app_config)
}

/// Asks before clobbering an existing output file
pub fn confirm_overwrite(app_config: &AppConfig) -> Result<()> {
    if let Some(path) = app_config.output_path() {
        if path.exists() && !confirm(&format!("{} exists, overwrite?", path.display()))? {
            return Err(CliError::UserCancelled.into());
        }
    }
    Ok(())
}
