//! Data models for the survey report.
//!
//! This module contains the survey field names, the response scales and
//! every aggregate result produced by the analysis layer.

use crate::error::{SurveyError, SurveyResult};
use crate::scanner::ScannedFile;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SUPPORT_LEVEL: &str = "support_level";
pub const SUPPORT_AFTER_INFO: &str = "support_after_info";
pub const FAIRNESS: &str = "fairness";
pub const GOVERNMENT_CONSIDERATION: &str = "government_consideration";
pub const POLICY_HELPFULNESS: &str = "policy_helpfulness";
pub const WASTE_SEVERITY: &str = "waste_severity";
pub const DISTANCE: &str = "Distance_artificial";
pub const RECYCLING_EFFORT: &str = "recycling_effort";
pub const FOOD_WASTE_BEHAVIOR: &str = "food_waste_behavior";

/// Prefix shared by the one-hot district indicator columns.
pub const DISTRICT_PREFIX: &str = "HongKongDistrict_";

/// Every Likert field on the 1..5 support scale.
pub const LIKERT_FIELDS: [&str; 6] = [
    SUPPORT_LEVEL,
    SUPPORT_AFTER_INFO,
    FAIRNESS,
    GOVERNMENT_CONSIDERATION,
    POLICY_HELPFULNESS,
    WASTE_SEVERITY,
];

/// The attitude fields shown together in the 2x2 grid, with panel titles.
pub const ATTITUDE_FIELDS: [(&str, &str); 4] = [
    (FAIRNESS, "Perceived Fairness"),
    (GOVERNMENT_CONSIDERATION, "Government Consideration"),
    (POLICY_HELPFULNESS, "Policy Helpfulness"),
    (WASTE_SEVERITY, "Waste Severity"),
];

/// Columns that must be present in every survey file.
pub const REQUIRED_FIELDS: [&str; 9] = [
    SUPPORT_LEVEL,
    SUPPORT_AFTER_INFO,
    FAIRNESS,
    GOVERNMENT_CONSIDERATION,
    POLICY_HELPFULNESS,
    WASTE_SEVERITY,
    DISTANCE,
    RECYCLING_EFFORT,
    FOOD_WASTE_BEHAVIOR,
];

/// A discrete ordinal response scale with a label per level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale {
    pub min: i64,
    pub max: i64,
    labels: &'static [&'static str],
}

/// The 1..5 support scale used by every Likert field.
pub const SUPPORT_SCALE: Scale = Scale {
    min: 1,
    max: 5,
    labels: &[
        "Strongly oppose",
        "Oppose",
        "Neutral",
        "Support",
        "Strongly support",
    ],
};

/// The 1..3 recycling effort scale.
pub const EFFORT_SCALE: Scale = Scale {
    min: 1,
    max: 3,
    labels: &["Low", "Medium", "High"],
};

impl Scale {
    /// All levels in ascending order.
    pub fn domain(&self) -> Vec<i64> {
        (self.min..=self.max).collect()
    }

    /// Returns the text label of a level.
    pub fn label(&self, level: i64) -> Option<&'static str> {
        if level < self.min || level > self.max {
            return None;
        }
        self.labels.get((level - self.min) as usize).copied()
    }

    /// Whether a raw value is one of the scale's integer levels.
    pub fn contains(&self, value: f64) -> bool {
        value.fract() == 0.0 && value >= self.min as f64 && value <= self.max as f64
    }

    /// Round and clamp a raw value onto the scale.
    pub fn clamp(&self, value: f64) -> f64 {
        value.round().clamp(self.min as f64, self.max as f64)
    }

    pub fn describe_domain(&self) -> String {
        format!("{}..={}", self.min, self.max)
    }
}

/// How out-of-domain values are treated at load time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Keep values untouched
    #[default]
    Passthrough,
    /// Fail on the first offending cell
    Reject,
    /// Coerce offending cells into the domain
    Clamp,
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationMode::Passthrough => write!(f, "passthrough"),
            ValidationMode::Reject => write!(f, "reject"),
            ValidationMode::Clamp => write!(f, "clamp"),
        }
    }
}

/// Count of one level in a frequency table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCount {
    pub level: i64,
    pub count: usize,
}

/// Occurrence counts of a field over a fixed domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyTable {
    pub field: String,
    /// One entry per domain level, in domain order.
    pub counts: Vec<LevelCount>,
    /// Non-missing values that matched no domain level.
    pub unmatched: usize,
}

impl FrequencyTable {
    /// Count for a level (0 when the level is outside the domain).
    #[allow(dead_code)] // Lookup accessor
    pub fn get(&self, level: i64) -> usize {
        self.counts
            .iter()
            .find(|c| c.level == level)
            .map(|c| c.count)
            .unwrap_or(0)
    }

    /// Sum of the in-domain counts.
    #[allow(dead_code)] // Lookup accessor
    pub fn total(&self) -> usize {
        self.counts.iter().map(|c| c.count).sum()
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().map(|c| c.count).max().unwrap_or(0)
    }
}

/// Minimum, quartiles and maximum of a numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FiveNumberSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Respondent total of one district indicator column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSum {
    pub group: String,
    pub total: f64,
}

/// Behaviour distribution within one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossTabRow {
    pub group: String,
    pub size: usize,
    /// Counts aligned with [`CrossTab::behaviors`].
    pub counts: Vec<usize>,
    /// Percentages of `size`, aligned with [`CrossTab::behaviors`].
    pub percentages: Vec<f64>,
}

impl CrossTabRow {
    #[allow(dead_code)] // Row sanity check
    pub fn percentage_total(&self) -> f64 {
        self.percentages.iter().sum()
    }
}

/// Percentage cross-tabulation of a behaviour by group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossTab {
    pub behaviors: Vec<String>,
    pub rows: Vec<CrossTabRow>,
    /// Groups left out because they had no members.
    pub empty_groups: Vec<String>,
}

impl CrossTab {
    /// Look up a group's row.
    ///
    /// Groups without members have no row and yield [`SurveyError::EmptyGroup`].
    #[allow(dead_code)] // Lookup accessor
    pub fn row(&self, group: &str) -> SurveyResult<&CrossTabRow> {
        if let Some(row) = self.rows.iter().find(|r| r.group == group) {
            return Ok(row);
        }
        if self.empty_groups.iter().any(|g| g == group) {
            Err(SurveyError::EmptyGroup(group.to_string()))
        } else {
            Err(SurveyError::FieldNotFound(group.to_string()))
        }
    }

    /// Percentage of a behaviour within a group, if both exist.
    #[allow(dead_code)] // Lookup accessor
    pub fn percentage(&self, group: &str, behavior: &str) -> Option<f64> {
        let idx = self.behaviors.iter().position(|b| b == behavior)?;
        let row = self.rows.iter().find(|r| r.group == group)?;
        row.percentages.get(idx).copied()
    }
}

/// Ordinary least-squares line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Equal-width histogram bins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBins {
    /// `counts.len() + 1` bin edges.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

/// Box-and-whisker statistics with 1.5 IQR whiskers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

/// Inferred storage kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Integer,
    Float,
    Boolean,
    Text,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Integer => write!(f, "int64"),
            ColumnKind::Float => write!(f, "float64"),
            ColumnKind::Boolean => write!(f, "bool"),
            ColumnKind::Text => write!(f, "object"),
        }
    }
}

/// Per-column overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub non_null: usize,
    pub kind: ColumnKind,
}

/// Descriptive statistics of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; absent with fewer than two values.
    pub std: Option<f64>,
    pub summary: FiveNumberSummary,
}

/// Descriptive statistics of a categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalStats {
    pub column: String,
    pub count: usize,
    pub unique: usize,
    pub top: Option<String>,
    pub freq: usize,
}

/// Correlation and trend between two fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub x_field: String,
    pub y_field: String,
    pub pairs: usize,
    pub correlation: Option<f64>,
    pub fit: Option<LinearFit>,
}

/// A chart written during the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartArtifact {
    pub chart: String,
    pub path: String,
}

/// Everything a run computed, serialisable as one JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurveySummary {
    pub source: String,
    pub rows: usize,
    pub columns: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub column_info: Vec<ColumnInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub numeric_stats: Vec<ColumnStats>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categorical_stats: Vec<CategoricalStats>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub frequency_tables: Vec<FrequencyTable>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub districts: Vec<GroupSum>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food_waste_by_district: Option<CrossTab>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<ColumnStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_vs_recycling: Option<Relationship>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub charts: Vec<ChartArtifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_files: Option<Vec<ScannedFile>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_labels() {
        assert_eq!(SUPPORT_SCALE.label(1), Some("Strongly oppose"));
        assert_eq!(SUPPORT_SCALE.label(5), Some("Strongly support"));
        assert_eq!(SUPPORT_SCALE.label(6), None);
        assert_eq!(EFFORT_SCALE.label(2), Some("Medium"));
        assert_eq!(SUPPORT_SCALE.domain(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_scale_contains_and_clamp() {
        assert!(SUPPORT_SCALE.contains(3.0));
        assert!(!SUPPORT_SCALE.contains(3.5));
        assert!(!SUPPORT_SCALE.contains(0.0));
        assert_eq!(SUPPORT_SCALE.clamp(7.0), 5.0);
        assert_eq!(SUPPORT_SCALE.clamp(-2.0), 1.0);
        assert_eq!(SUPPORT_SCALE.clamp(2.6), 3.0);
    }

    #[test]
    fn test_frequency_table_accessors() {
        let table = FrequencyTable {
            field: "support_level".to_string(),
            counts: vec![
                LevelCount { level: 1, count: 2 },
                LevelCount { level: 2, count: 0 },
                LevelCount { level: 3, count: 4 },
            ],
            unmatched: 1,
        };
        assert_eq!(table.get(3), 4);
        assert_eq!(table.get(9), 0);
        assert_eq!(table.total(), 6);
        assert_eq!(table.max_count(), 4);
    }

    #[test]
    fn test_cross_tab_row_lookup() {
        let tab = CrossTab {
            behaviors: vec!["Compost".to_string(), "Dispose".to_string()],
            rows: vec![CrossTabRow {
                group: "Sha Tin".to_string(),
                size: 4,
                counts: vec![1, 3],
                percentages: vec![25.0, 75.0],
            }],
            empty_groups: vec!["Islands".to_string()],
        };

        assert_eq!(tab.row("Sha Tin").map(|r| r.size).ok(), Some(4));
        assert!(matches!(tab.row("Islands"), Err(SurveyError::EmptyGroup(_))));
        assert!(matches!(tab.row("Atlantis"), Err(SurveyError::FieldNotFound(_))));
        assert_eq!(tab.percentage("Sha Tin", "Dispose"), Some(75.0));
    }

    #[test]
    fn test_validation_mode_serde() {
        let mode: ValidationMode = serde_json::from_str("\"clamp\"").unwrap();
        assert_eq!(mode, ValidationMode::Clamp);
        assert_eq!(ValidationMode::default(), ValidationMode::Passthrough);
        assert_eq!(ValidationMode::Reject.to_string(), "reject");
    }
}
