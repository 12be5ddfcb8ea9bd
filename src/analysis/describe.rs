//! Column overview and descriptive statistics.

use super::aggregator::{mean, sample_std, summarize};
use crate::dataset::{Column, Dataset};
use crate::error::{SurveyError, SurveyResult};
use crate::models::{CategoricalStats, ColumnInfo, ColumnKind, ColumnStats};
use std::collections::HashMap;

/// Name, non-null count and kind of every column.
pub fn column_info(dataset: &Dataset) -> Vec<ColumnInfo> {
    dataset
        .columns()
        .iter()
        .map(|c| ColumnInfo {
            name: c.name.clone(),
            non_null: c.non_null(),
            kind: c.kind(),
        })
        .collect()
}

fn stats_of(column: &Column) -> Option<ColumnStats> {
    let values = column.present_values();
    Some(ColumnStats {
        column: column.name.clone(),
        count: values.len(),
        mean: mean(&values)?,
        std: sample_std(&values),
        summary: summarize(&values)?,
    })
}

/// Descriptive statistics of one numeric field.
pub fn describe_column(dataset: &Dataset, field: &str) -> SurveyResult<ColumnStats> {
    let column = dataset.column(field)?;
    stats_of(column).ok_or_else(|| SurveyError::EmptyField(field.to_string()))
}

/// Descriptive statistics of every integer or float column.
pub fn describe_numeric(dataset: &Dataset) -> Vec<ColumnStats> {
    dataset
        .columns()
        .iter()
        .filter(|c| matches!(c.kind(), ColumnKind::Integer | ColumnKind::Float))
        .filter_map(stats_of)
        .collect()
}

/// Count, distinct values and most frequent value of every text or boolean column.
pub fn describe_categorical(dataset: &Dataset) -> Vec<CategoricalStats> {
    dataset
        .columns()
        .iter()
        .filter(|c| matches!(c.kind(), ColumnKind::Text | ColumnKind::Boolean))
        .map(|column| {
            let mut order: Vec<String> = Vec::new();
            let mut counts: HashMap<String, usize> = HashMap::new();
            for key in column.cells.iter().filter_map(|c| c.category()) {
                let entry = counts.entry(key.clone()).or_insert_with(|| {
                    order.push(key);
                    0
                });
                *entry += 1;
            }

            // First-seen value wins ties.
            let top = order
                .iter()
                .fold(None::<(&String, usize)>, |best, key| {
                    let n = counts[key];
                    match best {
                        Some((_, m)) if m >= n => best,
                        _ => Some((key, n)),
                    }
                });

            CategoricalStats {
                column: column.name.clone(),
                count: column.non_null(),
                unique: counts.len(),
                top: top.map(|(k, _)| k.clone()),
                freq: top.map(|(_, n)| n).unwrap_or(0),
            }
        })
        .collect()
}
