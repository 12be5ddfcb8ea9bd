//! Schema checks and the configurable value-validation policy.

use super::{Cell, Column, Dataset};
use crate::error::{SurveyError, SurveyResult};
use crate::models::{
    Scale, ValidationMode, DISTRICT_PREFIX, EFFORT_SCALE, LIKERT_FIELDS, RECYCLING_EFFORT,
    REQUIRED_FIELDS, SUPPORT_SCALE,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Validation modes for the two families of constrained columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationPolicy {
    /// Likert fields (1..5) and recycling effort (1..3).
    #[serde(default)]
    pub scales: ValidationMode,
    /// District indicator columns (0/1).
    #[serde(default)]
    pub indicators: ValidationMode,
}

/// Cells rewritten by a `clamp` policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub adjusted: usize,
    pub scale_cells: usize,
    pub indicator_cells: usize,
}

/// Fail with every required column that is absent.
pub fn validate_schema(dataset: &Dataset) -> SurveyResult<()> {
    let mut missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|field| !dataset.has_column(field))
        .map(|field| field.to_string())
        .collect();

    if dataset.columns_with_prefix(DISTRICT_PREFIX).is_empty() {
        missing.push(format!("{}*", DISTRICT_PREFIX));
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SurveyError::Schema { missing })
    }
}

/// The scale that constrains a field, if any.
pub fn scale_for(field: &str) -> Option<Scale> {
    if LIKERT_FIELDS.contains(&field) {
        Some(SUPPORT_SCALE)
    } else if field == RECYCLING_EFFORT {
        Some(EFFORT_SCALE)
    } else {
        None
    }
}

/// Apply `policy` to every constrained column in place.
pub fn apply_policy(
    dataset: &mut Dataset,
    policy: &ValidationPolicy,
) -> SurveyResult<ValidationReport> {
    let mut report = ValidationReport::default();

    for column in dataset.columns_mut() {
        if let Some(scale) = scale_for(&column.name) {
            let n = check_scale(column, scale, policy.scales)?;
            report.scale_cells += n;
        } else if column.name.starts_with(DISTRICT_PREFIX) {
            let n = check_indicator(column, policy.indicators)?;
            report.indicator_cells += n;
        }
    }

    report.adjusted = report.scale_cells + report.indicator_cells;
    debug!("Validation report: {:?}", report);
    Ok(report)
}

fn out_of_domain(column: &str, row: usize, cell: &Cell, domain: String) -> SurveyError {
    SurveyError::OutOfDomain {
        field: column.to_string(),
        row: row + 1,
        value: cell.to_string(),
        domain,
    }
}

fn check_scale(column: &mut Column, scale: Scale, mode: ValidationMode) -> SurveyResult<usize> {
    if mode == ValidationMode::Passthrough {
        return Ok(0);
    }

    let mut adjusted = 0;
    for (row, cell) in column.cells.iter_mut().enumerate() {
        if cell.is_missing() {
            continue;
        }

        let replacement = match cell.as_f64() {
            Some(v) if scale.contains(v) => continue,
            Some(v) => Cell::Number(scale.clamp(v)),
            None => Cell::Missing,
        };

        if mode == ValidationMode::Reject {
            return Err(out_of_domain(&column.name, row, cell, scale.describe_domain()));
        }
        *cell = replacement;
        adjusted += 1;
    }

    Ok(adjusted)
}

fn check_indicator(column: &mut Column, mode: ValidationMode) -> SurveyResult<usize> {
    if mode == ValidationMode::Passthrough {
        return Ok(0);
    }

    let boolean = column.cells.iter().any(|c| matches!(c, Cell::Bool(_)));
    let flag = |set: bool| {
        if boolean {
            Cell::Bool(set)
        } else {
            Cell::Number(if set { 1.0 } else { 0.0 })
        }
    };

    let mut adjusted = 0;
    for (row, cell) in column.cells.iter_mut().enumerate() {
        let replacement = match cell.as_f64() {
            Some(v) if v == 0.0 || v == 1.0 => continue,
            Some(v) => flag(v != 0.0),
            None => flag(false),
        };

        if mode == ValidationMode::Reject {
            return Err(out_of_domain(&column.name, row, cell, "{0, 1}".to_string()));
        }
        *cell = replacement;
        adjusted += 1;
    }

    Ok(adjusted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SUPPORT_LEVEL, REQUIRED_FIELDS};

    fn dataset_with(support: Vec<Cell>, district: Vec<Cell>) -> Dataset {
        let rows = support.len();
        let mut columns: Vec<Column> = REQUIRED_FIELDS
            .iter()
            .filter(|f| **f != SUPPORT_LEVEL)
            .map(|f| Column::new(*f, vec![Cell::Missing; rows]))
            .collect();
        columns.push(Column::new(SUPPORT_LEVEL, support));
        columns.push(Column::new("HongKongDistrict_Sha Tin", district));
        Dataset::new("test", columns)
    }

    #[test]
    fn test_schema_requires_district_columns() {
        let ds = Dataset::new(
            "test",
            REQUIRED_FIELDS
                .iter()
                .map(|f| Column::new(*f, vec![Cell::Missing]))
                .collect(),
        );

        match validate_schema(&ds) {
            Err(SurveyError::Schema { missing }) => {
                assert_eq!(missing, vec!["HongKongDistrict_*".to_string()]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_passthrough_keeps_values() {
        let mut ds = dataset_with(
            vec![Cell::Number(9.0), Cell::Number(2.0)],
            vec![Cell::Missing, Cell::Number(3.0)],
        );

        let report = apply_policy(&mut ds, &ValidationPolicy::default()).unwrap();
        assert_eq!(report.adjusted, 0);
        assert_eq!(ds.numeric(SUPPORT_LEVEL).unwrap(), vec![Some(9.0), Some(2.0)]);
    }

    #[test]
    fn test_reject_scale_reports_row() {
        let mut ds = dataset_with(
            vec![Cell::Number(2.0), Cell::Number(6.0)],
            vec![Cell::Number(1.0), Cell::Number(0.0)],
        );
        let policy = ValidationPolicy {
            scales: ValidationMode::Reject,
            indicators: ValidationMode::Reject,
        };

        match apply_policy(&mut ds, &policy) {
            Err(SurveyError::OutOfDomain { field, row, value, .. }) => {
                assert_eq!(field, SUPPORT_LEVEL);
                assert_eq!(row, 2);
                assert_eq!(value, "6");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_clamp_scale_and_indicator() {
        let mut ds = dataset_with(
            vec![Cell::Number(0.0), Cell::Number(7.0), Cell::Text("n/a?".into())],
            vec![Cell::Missing, Cell::Number(2.0), Cell::Number(1.0)],
        );
        let policy = ValidationPolicy {
            scales: ValidationMode::Clamp,
            indicators: ValidationMode::Clamp,
        };

        let report = apply_policy(&mut ds, &policy).unwrap();
        assert_eq!(report.scale_cells, 3);
        assert_eq!(report.indicator_cells, 2);
        assert_eq!(
            ds.numeric(SUPPORT_LEVEL).unwrap(),
            vec![Some(1.0), Some(5.0), None]
        );
        assert_eq!(
            ds.numeric("HongKongDistrict_Sha Tin").unwrap(),
            vec![Some(0.0), Some(1.0), Some(1.0)]
        );
    }

    #[test]
    fn test_reject_missing_indicator() {
        let mut ds = dataset_with(vec![Cell::Number(1.0)], vec![Cell::Missing]);
        let policy = ValidationPolicy {
            scales: ValidationMode::Passthrough,
            indicators: ValidationMode::Reject,
        };

        assert!(matches!(
            apply_policy(&mut ds, &policy),
            Err(SurveyError::OutOfDomain { .. })
        ));
    }

    #[test]
    fn test_scale_for() {
        assert_eq!(scale_for("fairness"), Some(SUPPORT_SCALE));
        assert_eq!(scale_for("recycling_effort"), Some(EFFORT_SCALE));
        assert_eq!(scale_for("Distance_artificial"), None);
    }
}
