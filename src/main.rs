use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use colored::Colorize;

use interval_aggregator::aggregators::{AggregationPipeline, AggregationReport};
use interval_aggregator::cli_helper::{confirm_overwrite, initialize_environment, prompt_for_missing};
use interval_aggregator::cli_utils::{format_count, format_kv, print_error, print_info, print_success, print_summary_table, print_warning};
use interval_aggregator::csv_io::{write_json, RecordReader, SummaryWriter};
use interval_aggregator::utils::app_config::{AggregatorArgs, AppConfig, OutputFormat};

fn main() {
    initialize_environment();
    let args = AggregatorArgs::parse();

    if let Err(e) = run(args) {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(args: AggregatorArgs) -> Result<()> {
    eprintln!("{}", "╔═══════════════════════════════════════════════════════╗".bright_cyan());
    eprintln!("{}", "║          Interval Aggregator                          ║".bright_cyan());
    eprintln!("{}", "╚═══════════════════════════════════════════════════════╝".bright_cyan());
    eprintln!();

    let mut app_config = AppConfig::from_args(&args)?;

    if args.interactive {
        app_config.input = None;
        app_config.aggregation.measurements.clear();
    }
    if app_config.needs_prompt() {
        app_config = prompt_for_missing(app_config)?;
        confirm_overwrite(&app_config)?;
    }

    let pipeline = AggregationPipeline::new(app_config.aggregation.clone())
        .context("invalid aggregation settings")?;

    let input = app_config
        .input
        .clone()
        .ok_or_else(|| anyhow!("no input file given"))?;

    eprintln!("{}", format_kv("Input", &input.display().to_string()));
    eprintln!("{}", format_kv("Interval", &pipeline.config().interval.to_string()));
    eprintln!("{}", format_kv("On error", &pipeline.config().on_error.to_string()));
    for spec in &pipeline.config().measurements {
        eprintln!("  {} {}", "•".dimmed(), spec);
    }
    eprintln!();

    let mut reader = RecordReader::from_path(&input, pipeline.config())
        .with_context(|| format!("failed to open {}", input.display()))?;
    for spec in reader.columns_past_header(&pipeline.config().measurements)? {
        print_warning(&format!(
            "column {} for '{}' is past the last header column",
            spec.source_column, spec.label
        ));
    }
    let report = pipeline
        .execute(reader)
        .with_context(|| format!("failed to aggregate {}", input.display()))?;

    write_report(&app_config, &pipeline, &report)?;

    eprintln!();
    eprintln!("{}", format_count("Records aggregated", report.records_processed));
    if report.records_skipped > 0 {
        eprintln!("{}", format_count("Records skipped", report.records_skipped).yellow());
    }
    print_success(&format!("{} intervals written", report.rows.len()));
    Ok(())
}

fn write_report(app_config: &AppConfig, pipeline: &AggregationPipeline, report: &AggregationReport) -> Result<()> {
    let specs = &pipeline.config().measurements;
    let output_path = app_config.output_path();

    match app_config.format {
        OutputFormat::Table => {
            print_summary_table(specs, &report.rows);
        }
        OutputFormat::Csv => match &output_path {
            Some(path) => {
                let mut writer = SummaryWriter::from_path(path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                writer.write_all(specs, &report.rows)?;
                print_info(&format!("Wrote {}", path.display()));
            }
            None => {
                let mut writer = SummaryWriter::new(io::stdout().lock());
                writer.write_all(specs, &report.rows)?;
            }
        },
        OutputFormat::Json => match &output_path {
            Some(path) => {
                let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
                let mut sink = BufWriter::new(file);
                write_json(&mut sink, &report.rows)?;
                sink.flush()?;
                print_info(&format!("Wrote {}", path.display()));
            }
            None => {
                let mut stdout = io::stdout().lock();
                write_json(&mut stdout, &report.rows)?;
                writeln!(stdout)?;
            }
        },
    }

    Ok(())
}
