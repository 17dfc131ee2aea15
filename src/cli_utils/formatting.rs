use colored::Colorize;

use crate::aggregators::records::{MeasurementSpec, SummaryRow};
use crate::csv_io::{header, row_cells};

/// Format a table with columns and rows
pub fn format_table(headers: &[String], rows: &[Vec<String>]) {
    let col_widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let mut width = header.len();
            for row in rows {
                if i < row.len() {
                    width = width.max(row[i].len());
                }
            }
            width
        })
        .collect();

    // Print header
    let header_line = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = col_widths[i]))
        .collect::<Vec<_>>()
        .join(" | ");

    println!("{}", header_line.bold());
    println!("{}", "-".repeat(header_line.len()));

    // Print rows
    for row in rows {
        let row_line = row
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:width$}", cell, width = col_widths.get(i).copied().unwrap_or(12)))
            .collect::<Vec<_>>()
            .join(" | ");
        println!("{}", row_line);
    }
}

/// Print summary rows as a table, same columns as the CSV output
pub fn print_summary_table(specs: &[MeasurementSpec], rows: &[SummaryRow]) {
    let cells: Vec<Vec<String>> = rows.iter().map(row_cells).collect();
    format_table(&header(specs), &cells);
}

/// Format a header
pub fn print_header(text: &str) {
    eprintln!();
    eprintln!("{}", text.bold().bright_cyan());
    eprintln!("{}", "=".repeat(text.chars().count()));
    eprintln!();
}

/// Format a count
pub fn format_count(label: &str, count: u64) -> String {
    format!("{}: {}", label, count.to_string().bright_cyan())
}

/// Format a key-value pair for display
pub fn format_kv(key: &str, value: &str) -> String {
    format!("{}: {}", key.bright_cyan(), value)
}
