use tracing::{debug, info, warn};

use crate::aggregators::accumulator::GroupAccumulator;
use crate::aggregators::config::{AggregatorsConfig, RecordPolicy};
use crate::aggregators::error::{AggregationError, Result};
use crate::aggregators::interval::IntervalKey;
use crate::aggregators::records::{LabeledStats, RawRecord, SummaryRow};
use crate::aggregators::stats;

/// Outcome of a run, rows plus record bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationReport {
    pub rows: Vec<SummaryRow>,
    pub records_processed: u64,
    pub records_skipped: u64,
}

/**
 * Mechanic:
 * - every record is assigned to the interval ending at or after its timestamp
 * - each configured cell is parsed and pushed under (interval, label)
 * - once input is exhausted, intervals are sorted and each (interval, label)
 *   group is reduced to average/min/max/count
 */
#[derive(Debug, Clone)]
pub struct AggregationPipeline {
    config: AggregatorsConfig,
}

impl AggregationPipeline {
    /// Validates the configuration up front, before any record is read
    pub fn new(config: AggregatorsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AggregatorsConfig {
        &self.config
    }

    /// Aggregates already-parsed records into summary rows
    pub fn run<I>(&self, records: I) -> Result<Vec<SummaryRow>>
    where
        I: IntoIterator<Item = RawRecord>,
    {
        Ok(self.execute(records.into_iter().map(Ok))?.rows)
    }

    /// Like `run`, for readers that can fail per record
    pub fn run_fallible<I>(&self, records: I) -> Result<Vec<SummaryRow>>
    where
        I: IntoIterator<Item = Result<RawRecord>>,
    {
        Ok(self.execute(records)?.rows)
    }

    /// Full run with processed/skipped counts
    pub fn execute<I>(&self, records: I) -> Result<AggregationReport>
    where
        I: IntoIterator<Item = Result<RawRecord>>,
    {
        let mut accumulator = GroupAccumulator::new();
        let mut records_processed = 0u64;
        let mut records_skipped = 0u64;

        for record in records {
            let outcome = record.and_then(|record| self.ingest(&record, &mut accumulator));

            match outcome {
                Ok(()) => records_processed += 1,
                Err(e) if e.is_record_error() && self.config.on_error == RecordPolicy::Skip => {
                    warn!("Skipping record: {}", e);
                    records_skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        let rows = self.reduce(&accumulator);

        info!(
            "Aggregated {} records into {} intervals of {} ({} skipped)",
            records_processed,
            rows.len(),
            self.config.interval,
            records_skipped
        );

        Ok(AggregationReport {
            rows,
            records_processed,
            records_skipped,
        })
    }

    /// Buckets one record. Every cell is checked before anything is pushed so
    /// a rejected record leaves the accumulator untouched.
    fn ingest(&self, record: &RawRecord, accumulator: &mut GroupAccumulator) -> Result<()> {
        let interval = self.config.interval.assign(record.timestamp);

        let mut readings = Vec::with_capacity(self.config.measurements.len());
        for spec in &self.config.measurements {
            let raw = record
                .value(spec.source_column)
                .ok_or_else(|| AggregationError::MissingColumn {
                    position: record.position,
                    column: spec.source_column,
                    label: spec.label.clone(),
                })?;

            let raw = raw.trim();
            if raw.is_empty() {
                debug!(
                    "{} => {} = <blank> ({})",
                    record.timestamp, interval, spec.label
                );
                continue;
            }

            let value = parse_measurement(raw).ok_or_else(|| AggregationError::ParseError {
                position: record.position,
                column: spec.source_column,
                label: spec.label.clone(),
                value: raw.to_string(),
            })?;

            debug!("{} => {} = {} ({})", record.timestamp, interval, value, spec.label);
            readings.push((spec.label.as_str(), value));
        }

        accumulator.observe(interval);
        for (label, value) in readings {
            accumulator.push(interval, label, value);
        }

        Ok(())
    }

    fn reduce(&self, accumulator: &GroupAccumulator) -> Vec<SummaryRow> {
        debug!(
            "Reducing {} groups across {} intervals",
            accumulator.len(),
            accumulator.interval_count()
        );
        let mut intervals: Vec<IntervalKey> = Vec::with_capacity(accumulator.interval_count());
        intervals.extend(accumulator.keys());
        intervals.sort_unstable();

        intervals
            .into_iter()
            .map(|interval| SummaryRow {
                interval,
                measurements: self
                    .config
                    .measurements
                    .iter()
                    .map(|spec| LabeledStats {
                        label: spec.label.clone(),
                        stats: stats::reduce(accumulator.values_for(interval, &spec.label)),
                    })
                    .collect(),
            })
            .collect()
    }
}

/// Finite decimal numbers only; "NaN" and "inf" are rejected
fn parse_measurement(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregators::interval::IntervalWidth;
    use crate::aggregators::records::MeasurementSpec;
    use chrono::NaiveDateTime;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn record(position: u64, at: &str, cells: &[&str]) -> RawRecord {
        let mut row = vec![at];
        row.extend_from_slice(cells);
        RawRecord::from_cells(position, ts(at), row)
    }

    fn pipeline(specs: &[(&str, usize)]) -> AggregationPipeline {
        let specs = specs
            .iter()
            .map(|(label, column)| MeasurementSpec::new(*label, *column))
            .collect();
        AggregationPipeline::new(AggregatorsConfig::new(IntervalWidth::default(), specs)).unwrap()
    }

    #[test]
    fn test_end_to_end_two_intervals() {
        let rows = pipeline(&[("temp", 1)])
            .run(vec![
                record(1, "2024-03-01 08:01", &["10"]),
                record(2, "2024-03-01 08:10", &["20"]),
                record(3, "2024-03-01 08:16", &["30"]),
            ])
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].timestamp(), "2024-03-01T08:15:00+00:00");
        let first = rows[0].stats_for("temp").unwrap();
        assert_eq!(first.average, Some(15.0));
        assert_eq!(first.min, Some(10.0));
        assert_eq!(first.max, Some(20.0));
        assert_eq!(first.count, 2);

        assert_eq!(rows[1].timestamp(), "2024-03-01T08:30:00+00:00");
        let second = rows[1].stats_for("temp").unwrap();
        assert_eq!(second.average, Some(30.0));
        assert_eq!(second.min, Some(30.0));
        assert_eq!(second.max, Some(30.0));
        assert_eq!(second.count, 1);
    }

    #[test]
    fn test_rows_are_ascending_without_duplicates() {
        let rows = pipeline(&[("temp", 1)])
            .run(vec![
                record(1, "2024-03-01 10:40", &["1"]),
                record(2, "2024-03-01 08:05", &["2"]),
                record(3, "2024-03-01 09:15", &["3"]),
                record(4, "2024-03-01 08:14", &["4"]),
                record(5, "2024-03-01 10:31", &["5"]),
            ])
            .unwrap();

        let keys: Vec<_> = rows.iter().map(|r| r.interval).collect();
        assert_eq!(keys.len(), 3);
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_single_record_per_interval_round_trips() {
        let rows = pipeline(&[("kw", 1)])
            .run(vec![
                record(1, "2024-03-01 00:15", &["3.25"]),
                record(2, "2024-03-01 00:30", &["-1.5"]),
            ])
            .unwrap();

        for (row, expected) in rows.iter().zip([3.25, -1.5]) {
            let stats = row.stats_for("kw").unwrap();
            assert_eq!(stats.average, Some(expected));
            assert_eq!(stats.min, Some(expected));
            assert_eq!(stats.max, Some(expected));
            assert_eq!(stats.count, 1);
        }
    }

    #[test]
    fn test_label_missing_from_interval_gets_no_data_markers() {
        let rows = pipeline(&[("temp", 1), ("humidity", 2)])
            .run(vec![
                record(1, "2024-03-01 08:05", &["20", "40"]),
                record(2, "2024-03-01 08:20", &["21", ""]),
            ])
            .unwrap();

        assert_eq!(rows.len(), 2);
        let humidity = rows[1].stats_for("humidity").unwrap();
        assert_eq!(humidity.count, 0);
        assert_eq!(humidity.average, None);
        assert_eq!(rows[1].stats_for("temp").unwrap().count, 1);
    }

    #[test]
    fn test_interval_with_only_blank_cells_still_emits_row() {
        let rows = pipeline(&[("temp", 1)])
            .run(vec![record(1, "2024-03-01 08:05", &[" "])])
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert!(rows[0].stats_for("temp").unwrap().is_empty());
    }

    #[test]
    fn test_output_follows_declared_label_order() {
        let rows = pipeline(&[("b", 2), ("a", 1)])
            .run(vec![record(1, "2024-03-01 08:05", &["1", "2"])])
            .unwrap();

        let labels: Vec<_> = rows[0].measurements.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["b", "a"]);
        assert_eq!(rows[0].stats_for("b").unwrap().average, Some(2.0));
    }

    #[test]
    fn test_numeric_min_max_over_text_cells() {
        let rows = pipeline(&[("temp", 1)])
            .run(vec![
                record(1, "2024-03-01 08:01", &["9"]),
                record(2, "2024-03-01 08:02", &["10"]),
            ])
            .unwrap();

        let stats = rows[0].stats_for("temp").unwrap();
        assert_eq!(stats.min, Some(9.0));
        assert_eq!(stats.max, Some(10.0));
    }

    #[test]
    fn test_fail_fast_on_unparsable_value() {
        let err = pipeline(&[("temp", 1)])
            .run(vec![
                record(1, "2024-03-01 08:01", &["9"]),
                record(2, "2024-03-01 08:02", &["warm"]),
            ])
            .unwrap_err();

        match err {
            AggregationError::ParseError {
                position,
                column,
                value,
                ..
            } => {
                assert_eq!(position, 2);
                assert_eq!(column, 1);
                assert_eq!(value, "warm");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_column_fails() {
        let err = pipeline(&[("temp", 1), ("kw", 5)])
            .run(vec![record(1, "2024-03-01 08:01", &["9"])])
            .unwrap_err();

        assert!(matches!(
            err,
            AggregationError::MissingColumn { column: 5, .. }
        ));
    }

    #[test]
    fn test_skip_policy_drops_whole_record() {
        let config = AggregatorsConfig::new(
            IntervalWidth::default(),
            vec![MeasurementSpec::new("temp", 1), MeasurementSpec::new("kw", 2)],
        )
        .with_policy(RecordPolicy::Skip);

        let report = AggregationPipeline::new(config)
            .unwrap()
            .execute(vec![
                Ok(record(1, "2024-03-01 08:01", &["10", "1"])),
                Ok(record(2, "2024-03-01 08:02", &["20", "oops"])),
                Err(AggregationError::invalid_record(3, "unparsable timestamp")),
                Ok(record(4, "2024-03-01 08:31", &["30"])),
            ])
            .unwrap();

        assert_eq!(report.records_processed, 1);
        assert_eq!(report.records_skipped, 3);
        assert_eq!(report.rows.len(), 1);
        // the rejected record's valid temp cell must not leak in
        assert_eq!(report.rows[0].stats_for("temp").unwrap().count, 1);
    }

    #[test]
    fn test_fail_fast_surfaces_reader_errors() {
        let err = pipeline(&[("temp", 1)])
            .run_fallible(vec![Err(AggregationError::invalid_record(
                1,
                "unparsable timestamp",
            ))])
            .unwrap_err();

        assert!(matches!(err, AggregationError::InvalidRecord { position: 1, .. }));
    }

    #[test]
    fn test_skip_policy_still_stops_on_io_errors() {
        let config = AggregatorsConfig::new(IntervalWidth::default(), vec![MeasurementSpec::new("t", 1)])
            .with_policy(RecordPolicy::Skip);

        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated");
        let result = AggregationPipeline::new(config)
            .unwrap()
            .run_fallible(vec![Err(AggregationError::Io(io))]);

        assert!(matches!(result, Err(AggregationError::Io(_))));
    }

    #[test]
    fn test_invalid_configuration_rejected_before_processing() {
        let config = AggregatorsConfig::new(
            IntervalWidth::default(),
            vec![MeasurementSpec::new("temp", 1), MeasurementSpec::new("temp", 2)],
        );
        assert!(matches!(
            AggregationPipeline::new(config),
            Err(AggregationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        assert_eq!(parse_measurement("12.5"), Some(12.5));
        assert_eq!(parse_measurement("-3e2"), Some(-300.0));
        assert_eq!(parse_measurement("NaN"), None);
        assert_eq!(parse_measurement("inf"), None);
    }

    #[test]
    fn test_empty_input_produces_no_rows() {
        let report = pipeline(&[("temp", 1)]).execute(Vec::<Result<RawRecord>>::new()).unwrap();
        assert!(report.rows.is_empty());
        assert_eq!(report.records_processed, 0);
    }
}
