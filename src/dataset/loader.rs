//! CSV ingestion.
//!
//! Reads a comma-delimited survey file with a header row, checks the schema
//! and applies the configured validation policy.

use super::validate::{apply_policy, validate_schema, ValidationPolicy};
use super::{Cell, Column, Dataset};
use crate::error::{SurveyError, SurveyResult};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load and validate the survey file at `path`.
pub fn load_dataset(path: &Path, policy: &ValidationPolicy) -> SurveyResult<Dataset> {
    info!("Loading survey data from {}", path.display());

    let file = File::open(path).map_err(|source| SurveyError::DataAccess {
        path: path.to_path_buf(),
        source,
    })?;

    Dataset::from_reader(file, &path.display().to_string(), policy)
}

impl Dataset {
    /// Parse survey CSV from any reader.
    pub fn from_reader<R: Read>(
        reader: R,
        source_name: &str,
        policy: &ValidationPolicy,
    ) -> SurveyResult<Self> {
        let mut dataset = parse_csv(reader, source_name)?;
        let (rows, cols) = dataset.shape();
        debug!("Parsed {} rows and {} columns from {}", rows, cols, source_name);

        validate_schema(&dataset)?;

        let report = apply_policy(&mut dataset, policy)?;
        if report.adjusted > 0 {
            warn!(
                "Validation adjusted {} cells ({} scale, {} indicator)",
                report.adjusted, report.scale_cells, report.indicator_cells
            );
        }

        info!("Dataset loaded: {} rows, {} columns", rows, cols);
        Ok(dataset)
    }
}

fn parse_csv<R: Read>(reader: R, source_name: &str) -> SurveyResult<Dataset> {
    let malformed = |source: csv::Error| SurveyError::MalformedData {
        source_name: source_name.to_string(),
        source,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(malformed)?
        .iter()
        .map(String::from)
        .collect();

    let mut cells: Vec<Vec<Cell>> = vec![Vec::new(); headers.len()];
    for record in rdr.records() {
        let record = record.map_err(malformed)?;
        for (column, field) in cells.iter_mut().zip(record.iter()) {
            column.push(Cell::parse(field));
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, cells)| Column::new(name, cells))
        .collect();

    Ok(Dataset::new(source_name, columns))
}
