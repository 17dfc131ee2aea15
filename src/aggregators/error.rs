use thiserror::Error;

/// Errors raised while configuring or running an aggregation
#[derive(Error, Debug)]
pub enum AggregationError {
    /// Bad interval width, empty or duplicate labels, no measurements
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Record could not be turned into a timestamped row
    #[error("Invalid record at row {position}: {reason}")]
    InvalidRecord { position: u64, reason: String },

    /// Configured source column is absent from the record
    #[error("Row {position} has no column {column} (measurement '{label}')")]
    MissingColumn {
        position: u64,
        column: usize,
        label: String,
    },

    /// Measurement cell is not a number
    #[error("Row {position}, column {column} (measurement '{label}'): '{value}' is not numeric")]
    ParseError {
        position: u64,
        column: usize,
        label: String,
        value: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AggregationError {
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub fn invalid_record(position: u64, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            position,
            reason: reason.into(),
        }
    }

    /// Whether the error belongs to a single record rather than the whole run
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            AggregationError::InvalidRecord { .. }
                | AggregationError::MissingColumn { .. }
                | AggregationError::ParseError { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AggregationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_errors_are_classified() {
        assert!(AggregationError::invalid_record(3, "bad timestamp").is_record_error());
        assert!(
            AggregationError::MissingColumn {
                position: 1,
                column: 4,
                label: "temp".to_string(),
            }
            .is_record_error()
        );
        assert!(!AggregationError::invalid_configuration("width").is_record_error());
    }

    #[test]
    fn test_parse_error_names_offending_cell() {
        let err = AggregationError::ParseError {
            position: 7,
            column: 2,
            label: "humidity".to_string(),
            value: "n/a".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Row 7"));
        assert!(msg.contains("column 2"));
        assert!(msg.contains("'n/a'"));
    }
}
