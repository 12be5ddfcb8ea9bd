//! Error types for loading, aggregating and rendering survey data.

use std::path::PathBuf;
use thiserror::Error;

/// Every failure the survey pipeline can surface.
#[derive(Debug, Error)]
pub enum SurveyError {
    /// The survey file is missing or unreadable.
    #[error("cannot read survey data from {}", .path.display())]
    DataAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV layer rejected a record.
    #[error("malformed survey data in {source_name}")]
    MalformedData {
        source_name: String,
        #[source]
        source: csv::Error,
    },

    /// Required columns are absent from the header row.
    #[error("survey data is missing required columns: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    /// A named field does not exist in the dataset.
    #[error("field not found: {0}")]
    FieldNotFound(String),

    /// A field has no numeric values to summarise.
    #[error("field {0} has no numeric values")]
    EmptyField(String),

    /// A cross-tab group has zero members.
    #[error("group {0} has no members")]
    EmptyGroup(String),

    /// A cell violates the configured validation policy.
    #[error("row {row}: {field} value '{value}' is outside the allowed domain {domain}")]
    OutOfDomain {
        field: String,
        row: usize,
        value: String,
        domain: String,
    },

    /// The chart output directory could not be prepared.
    #[error("cannot prepare output directory {}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A chart failed to draw or encode.
    #[error("failed to render {chart}: {message}")]
    Render { chart: String, message: String },
}

pub type SurveyResult<T> = std::result::Result<T, SurveyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_lists_columns() {
        let err = SurveyError::Schema {
            missing: vec!["fairness".to_string(), "waste_severity".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "survey data is missing required columns: fairness, waste_severity"
        );
    }

    #[test]
    fn test_data_access_keeps_source() {
        let err = SurveyError::DataAccess {
            path: PathBuf::from("missing.csv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert!(err.to_string().contains("missing.csv"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
