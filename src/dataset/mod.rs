//! In-memory survey dataset.
//!
//! The dataset is stored by column. Each cell keeps the typed value parsed
//! from the CSV file so that aggregation never re-parses text.

pub mod loader;
pub mod validate;

pub use loader::load_dataset;
pub use validate::ValidationPolicy;

use crate::error::{SurveyError, SurveyResult};
use crate::models::ColumnKind;
use std::fmt;

/// A single survey response value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Bool(bool),
    Number(f64),
    Text(String),
}

/// Markers read as missing values.
const NA_MARKERS: [&str; 9] = ["NA", "N/A", "n/a", "NaN", "nan", "null", "NULL", "None", "#N/A"];

impl Cell {
    /// Parse a raw CSV field.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || NA_MARKERS.contains(&trimmed) {
            return Cell::Missing;
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return Cell::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Cell::Bool(false);
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Cell::Number(v),
            _ => Cell::Text(trimmed.to_string()),
        }
    }

    /// Numeric view of the cell; booleans count as 1/0.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Cell::Missing | Cell::Text(_) => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Category key of the cell, `None` when missing.
    pub fn category(&self) -> Option<String> {
        match self {
            Cell::Missing => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => write!(f, "NaN"),
            Cell::Bool(true) => write!(f, "True"),
            Cell::Bool(false) => write!(f, "False"),
            Cell::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{}", *v as i64),
            Cell::Number(v) => write!(f, "{}", v),
            Cell::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One named survey column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    /// Infer the storage kind from the non-missing cells.
    pub fn kind(&self) -> ColumnKind {
        let mut present = self.cells.iter().filter(|c| !c.is_missing()).peekable();
        if present.peek().is_none() {
            return ColumnKind::Float;
        }

        let mut all_bool = true;
        let mut all_number = true;
        let mut all_integral = true;
        let mut any_missing = false;

        for cell in &self.cells {
            match cell {
                Cell::Missing => any_missing = true,
                Cell::Bool(_) => all_number = false,
                Cell::Number(v) => {
                    all_bool = false;
                    if v.fract() != 0.0 {
                        all_integral = false;
                    }
                }
                Cell::Text(_) => {
                    all_bool = false;
                    all_number = false;
                }
            }
        }

        if all_bool && !any_missing {
            ColumnKind::Boolean
        } else if all_number && all_integral && !any_missing {
            ColumnKind::Integer
        } else if all_number {
            ColumnKind::Float
        } else {
            ColumnKind::Text
        }
    }

    #[allow(dead_code)] // Utility for column inspection
    pub fn is_numeric(&self) -> bool {
        matches!(
            self.kind(),
            ColumnKind::Integer | ColumnKind::Float | ColumnKind::Boolean
        )
    }

    pub fn non_null(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_missing()).count()
    }

    /// Numeric values with missing and non-numeric cells as `None`.
    pub fn numeric(&self) -> Vec<Option<f64>> {
        self.cells.iter().map(Cell::as_f64).collect()
    }

    /// Present numeric values only.
    pub fn present_values(&self) -> Vec<f64> {
        self.cells.iter().filter_map(Cell::as_f64).collect()
    }
}

/// The loaded survey: rows are respondents, columns are survey fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    source: String,
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    /// Build a dataset from columns of equal length.
    pub fn new(source: impl Into<String>, columns: Vec<Column>) -> Self {
        let rows = columns.first().map(|c| c.cells.len()).unwrap_or(0);
        debug_assert!(columns.iter().all(|c| c.cells.len() == rows));
        Self {
            source: source.into(),
            columns,
            rows,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns.len())
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Look up a column by exact name.
    pub fn column(&self, name: &str) -> SurveyResult<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| SurveyError::FieldNotFound(name.to_string()))
    }

    /// Numeric view of a column.
    pub fn numeric(&self, name: &str) -> SurveyResult<Vec<Option<f64>>> {
        Ok(self.column(name)?.numeric())
    }

    /// Names of the columns starting with `prefix`, in file order.
    pub fn columns_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.name.starts_with(prefix))
            .map(|c| c.name.clone())
            .collect()
    }

    /// The first `n` rows, each as a list of cells in column order.
    pub fn head(&self, n: usize) -> Vec<Vec<&Cell>> {
        (0..self.rows.min(n))
            .map(|row| self.columns.iter().map(|c| &c.cells[row]).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_parse() {
        assert_eq!(Cell::parse(""), Cell::Missing);
        assert_eq!(Cell::parse("NaN"), Cell::Missing);
        assert_eq!(Cell::parse(" 3 "), Cell::Number(3.0));
        assert_eq!(Cell::parse("12.5"), Cell::Number(12.5));
        assert_eq!(Cell::parse("True"), Cell::Bool(true));
        assert_eq!(Cell::parse("false"), Cell::Bool(false));
        assert_eq!(
            Cell::parse("Separate and compost"),
            Cell::Text("Separate and compost".to_string())
        );
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Number(4.0).to_string(), "4");
        assert_eq!(Cell::Number(4.25).to_string(), "4.25");
        assert_eq!(Cell::Bool(true).to_string(), "True");
        assert_eq!(Cell::Missing.category(), None);
    }

    #[test]
    fn test_column_kind() {
        let ints = Column::new("a", vec![Cell::Number(1.0), Cell::Number(2.0)]);
        assert_eq!(ints.kind(), ColumnKind::Integer);

        let with_gap = Column::new("b", vec![Cell::Number(1.0), Cell::Missing]);
        assert_eq!(with_gap.kind(), ColumnKind::Float);

        let flags = Column::new("c", vec![Cell::Bool(true), Cell::Bool(false)]);
        assert_eq!(flags.kind(), ColumnKind::Boolean);

        let text = Column::new("d", vec![Cell::Text("x".into()), Cell::Number(1.0)]);
        assert_eq!(text.kind(), ColumnKind::Text);
        assert!(!text.is_numeric());
    }

    #[test]
    fn test_dataset_lookup() {
        let ds = Dataset::new(
            "inline",
            vec![
                Column::new("support_level", vec![Cell::Number(1.0), Cell::Missing]),
                Column::new("HongKongDistrict_Sha Tin", vec![Cell::Bool(true), Cell::Bool(false)]),
            ],
        );

        assert_eq!(ds.shape(), (2, 2));
        assert_eq!(ds.numeric("support_level").unwrap(), vec![Some(1.0), None]);
        assert!(matches!(
            ds.column("fairness"),
            Err(SurveyError::FieldNotFound(name)) if name == "fairness"
        ));
        assert_eq!(
            ds.columns_with_prefix("HongKongDistrict_"),
            vec!["HongKongDistrict_Sha Tin".to_string()]
        );
        assert_eq!(ds.head(5).len(), 2);
    }
}
