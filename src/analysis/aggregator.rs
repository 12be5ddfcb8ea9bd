//! Survey aggregation and statistics.
//!
//! Pure functions over a [`Dataset`]: frequency counts, quantiles, district
//! sums, cross-tabulation, correlation and the helpers used by the charts.

use crate::dataset::{Cell, Dataset};
use crate::error::{SurveyError, SurveyResult};
use crate::models::{
    BoxStats, CrossTab, CrossTabRow, FiveNumberSummary, FrequencyTable, GroupSum, HistogramBins,
    LevelCount, LinearFit, Relationship,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Headroom added above the tallest bar of charts that share a y axis.
const AXIS_HEADROOM: usize = 5;

/// Count each domain level of `field`, in domain order.
pub fn frequency_table(dataset: &Dataset, field: &str, domain: &[i64]) -> SurveyResult<FrequencyTable> {
    let column = dataset.column(field)?;

    let mut counts: Vec<LevelCount> = domain
        .iter()
        .map(|&level| LevelCount { level, count: 0 })
        .collect();
    let mut unmatched = 0;

    for value in column.cells.iter().filter_map(Cell::as_f64) {
        match counts.iter_mut().find(|c| c.level as f64 == value) {
            Some(entry) => entry.count += 1,
            None => unmatched += 1,
        }
    }

    Ok(FrequencyTable {
        field: field.to_string(),
        counts,
        unmatched,
    })
}

/// Linear-interpolation quantile of sorted, non-empty values.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let h = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Five-number summary of a slice of values.
pub fn summarize(values: &[f64]) -> Option<FiveNumberSummary> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted_copy(values);
    Some(FiveNumberSummary {
        min: sorted[0],
        q1: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q3: quantile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    })
}

/// Five-number summary of `field`, ignoring missing values.
#[allow(dead_code)] // Single-field form of describe_column
pub fn five_number_summary(dataset: &Dataset, field: &str) -> SurveyResult<FiveNumberSummary> {
    let values = dataset.column(field)?.present_values();
    summarize(&values).ok_or_else(|| SurveyError::EmptyField(field.to_string()))
}

/// Sum each indicator column; the group name is the field without `prefix`.
pub fn group_sums(dataset: &Dataset, fields: &[String], prefix: &str) -> SurveyResult<Vec<GroupSum>> {
    fields
        .iter()
        .map(|field| {
            let total = dataset.column(field)?.present_values().iter().sum();
            Ok(GroupSum {
                group: strip_group_prefix(field, prefix),
                total,
            })
        })
        .collect()
}

fn strip_group_prefix(field: &str, prefix: &str) -> String {
    field.strip_prefix(prefix).unwrap_or(field).to_string()
}

/// Sort group sums by total, ties broken by name.
pub fn sort_groups_by_total(sums: &mut [GroupSum], descending: bool) {
    sums.sort_by(|a, b| {
        let ord = a.total.total_cmp(&b.total).then_with(|| a.group.cmp(&b.group));
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
}

/// Default membership test for one-hot indicators.
pub fn is_indicator_member(cell: &Cell) -> bool {
    cell.as_f64() == Some(1.0)
}

/// Percentage distribution of `behavior_field` within each group.
///
/// A group's members are the rows where `is_member` holds for its column.
/// Groups with no members are omitted from the rows and listed in
/// `empty_groups` instead.
pub fn cross_tab_percentage<F>(
    dataset: &Dataset,
    group_fields: &[String],
    prefix: &str,
    behavior_field: &str,
    is_member: F,
) -> SurveyResult<CrossTab>
where
    F: Fn(&Cell) -> bool,
{
    let behavior = dataset.column(behavior_field)?;

    let mut groups: BTreeMap<String, (usize, BTreeMap<String, usize>)> = BTreeMap::new();
    let mut behaviors: BTreeSet<String> = BTreeSet::new();
    let mut empty_groups = Vec::new();

    for field in group_fields {
        let column = dataset.column(field)?;
        let group = strip_group_prefix(field, prefix);

        let mut size = 0;
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for (cell, answer) in column.cells.iter().zip(&behavior.cells) {
            if !is_member(cell) {
                continue;
            }
            size += 1;
            if let Some(key) = answer.category() {
                behaviors.insert(key.clone());
                *counts.entry(key).or_default() += 1;
            }
        }

        if size == 0 {
            debug!("Group {} has no members; omitted from cross-tab", group);
            empty_groups.push(group);
        } else {
            groups.insert(group, (size, counts));
        }
    }

    let behaviors: Vec<String> = behaviors.into_iter().collect();
    let rows = groups
        .into_iter()
        .map(|(group, (size, counts))| {
            let counts: Vec<usize> = behaviors
                .iter()
                .map(|b| counts.get(b).copied().unwrap_or(0))
                .collect();
            let percentages = counts
                .iter()
                .map(|&c| c as f64 / size as f64 * 100.0)
                .collect();
            CrossTabRow {
                group,
                size,
                counts,
                percentages,
            }
        })
        .collect();

    Ok(CrossTab {
        behaviors,
        rows,
        empty_groups,
    })
}

/// Row-aligned pairs where both fields hold a numeric value.
pub fn paired_values(dataset: &Dataset, a: &str, b: &str) -> SurveyResult<Vec<(f64, f64)>> {
    let xs = dataset.numeric(a)?;
    let ys = dataset.numeric(b)?;
    Ok(xs
        .into_iter()
        .zip(ys)
        .filter_map(|(x, y)| Some((x?, y?)))
        .collect())
}

struct Moments {
    mean_x: f64,
    mean_y: f64,
    sxx: f64,
    syy: f64,
    sxy: f64,
}

fn moments(pairs: &[(f64, f64)]) -> Option<Moments> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for &(x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    Some(Moments {
        mean_x,
        mean_y,
        sxx,
        syy,
        sxy,
    })
}

fn correlation_of(m: &Moments) -> Option<f64> {
    if m.sxx == 0.0 || m.syy == 0.0 {
        return None;
    }
    Some((m.sxy / (m.sxx * m.syy).sqrt()).clamp(-1.0, 1.0))
}

fn fit_of(m: &Moments) -> Option<LinearFit> {
    if m.sxx == 0.0 {
        return None;
    }
    let slope = m.sxy / m.sxx;
    Some(LinearFit {
        slope,
        intercept: m.mean_y - slope * m.mean_x,
    })
}

/// Pearson correlation over the complete pairs of `a` and `b`.
///
/// `None` when fewer than two pairs exist or either side is constant.
#[allow(dead_code)] // Convenience wrapper over relationship
pub fn pearson_correlation(dataset: &Dataset, a: &str, b: &str) -> SurveyResult<Option<f64>> {
    let pairs = paired_values(dataset, a, b)?;
    Ok(moments(&pairs).as_ref().and_then(correlation_of))
}

/// Least-squares line of `b` on `a` over the complete pairs.
#[allow(dead_code)] // Convenience wrapper over relationship
pub fn linear_fit(dataset: &Dataset, a: &str, b: &str) -> SurveyResult<Option<LinearFit>> {
    let pairs = paired_values(dataset, a, b)?;
    Ok(moments(&pairs).as_ref().and_then(fit_of))
}

/// Correlation and trend line of `b` against `a` in one pass.
pub fn relationship(dataset: &Dataset, a: &str, b: &str) -> SurveyResult<Relationship> {
    let pairs = paired_values(dataset, a, b)?;
    let m = moments(&pairs);
    Ok(Relationship {
        x_field: a.to_string(),
        y_field: b.to_string(),
        pairs: pairs.len(),
        correlation: m.as_ref().and_then(correlation_of),
        fit: m.as_ref().and_then(fit_of),
    })
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn median(values: &[f64]) -> Option<f64> {
    summarize(values).map(|s| s.median)
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Equal-width bins over `[min, max]`; the last bin includes `max`.
pub fn histogram(values: &[f64], bins: usize) -> Option<HistogramBins> {
    if values.is_empty() || bins == 0 {
        return None;
    }
    let sorted = sorted_copy(values);
    let (mut lo, mut hi) = (sorted[0], sorted[sorted.len() - 1]);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Some(HistogramBins { edges, counts })
}

/// Quartiles, 1.5 IQR whiskers and outliers.
pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    let summary = summarize(values)?;
    let iqr = summary.q3 - summary.q1;
    let low_fence = summary.q1 - 1.5 * iqr;
    let high_fence = summary.q3 + 1.5 * iqr;

    let sorted = sorted_copy(values);
    let inside: Vec<f64> = sorted
        .iter()
        .copied()
        .filter(|v| *v >= low_fence && *v <= high_fence)
        .collect();
    let outliers = sorted
        .iter()
        .copied()
        .filter(|v| *v < low_fence || *v > high_fence)
        .collect();

    Some(BoxStats {
        q1: summary.q1,
        median: summary.median,
        q3: summary.q3,
        whisker_low: inside.first().copied().unwrap_or(summary.q1),
        whisker_high: inside.last().copied().unwrap_or(summary.q3),
        outliers,
    })
}

/// Shared y-axis limit for side-by-side frequency charts.
pub fn shared_axis_max(tables: &[&FrequencyTable]) -> usize {
    tables.iter().map(|t| t.max_count()).max().unwrap_or(0) + AXIS_HEADROOM
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Column, ValidationPolicy};
    use crate::models::{
        DISTANCE, DISTRICT_PREFIX, FOOD_WASTE_BEHAVIOR, LIKERT_FIELDS, RECYCLING_EFFORT,
        SUPPORT_LEVEL, SUPPORT_SCALE,
    };

    const SAMPLE: &str = include_str!("../../fixtures/survey_sample.csv");

    fn fixture() -> Dataset {
        Dataset::from_reader(SAMPLE.as_bytes(), "fixture", &ValidationPolicy::default()).unwrap()
    }

    fn numbers(name: &str, values: &[f64]) -> Column {
        Column::new(name, values.iter().map(|v| Cell::Number(*v)).collect())
    }

    #[test]
    fn test_frequency_table_fills_absent_levels() {
        let ds = Dataset::new(
            "inline",
            vec![numbers(SUPPORT_LEVEL, &[1.0, 1.0, 2.0, 3.0, 5.0, 5.0, 5.0])],
        );

        let table = frequency_table(&ds, SUPPORT_LEVEL, &SUPPORT_SCALE.domain()).unwrap();
        let pairs: Vec<(i64, usize)> = table.counts.iter().map(|c| (c.level, c.count)).collect();
        assert_eq!(pairs, vec![(1, 2), (2, 1), (3, 1), (4, 0), (5, 3)]);
        assert_eq!(table.unmatched, 0);
    }

    #[test]
    fn test_frequency_counts_sum_to_non_missing() {
        let ds = fixture();
        for field in LIKERT_FIELDS {
            let table = frequency_table(&ds, field, &SUPPORT_SCALE.domain()).unwrap();
            assert_eq!(table.counts.len(), 5);
            let non_missing = ds.column(field).unwrap().non_null();
            assert_eq!(table.total() + table.unmatched, non_missing, "{field}");
        }
    }

    #[test]
    fn test_frequency_table_unknown_field() {
        let ds = fixture();
        assert!(matches!(
            frequency_table(&ds, "satisfaction", &[1, 2]),
            Err(SurveyError::FieldNotFound(_))
        ));
    }

    #[test]
    fn test_five_number_summary_scenario() {
        let ds = Dataset::new("inline", vec![numbers(DISTANCE, &[10.0, 20.0, 30.0, 40.0, 50.0])]);

        let s = five_number_summary(&ds, DISTANCE).unwrap();
        assert_eq!(s.min, 10.0);
        assert_eq!(s.q1, 20.0);
        assert_eq!(s.median, 30.0);
        assert_eq!(s.q3, 40.0);
        assert_eq!(s.max, 50.0);
    }

    #[test]
    fn test_five_number_summary_interpolates() {
        let s = five_number_summary(&fixture(), DISTANCE).unwrap();
        assert_eq!(s.min, 45.0);
        assert!((s.q1 - 91.25).abs() < 1e-9);
        assert!((s.median - 162.5).abs() < 1e-9);
        assert!((s.q3 - 265.0).abs() < 1e-9);
        assert_eq!(s.max, 500.0);
        assert!(s.min <= s.q1 && s.q1 <= s.median && s.median <= s.q3 && s.q3 <= s.max);
    }

    #[test]
    fn test_five_number_summary_empty_field() {
        let ds = Dataset::new("inline", vec![Column::new(DISTANCE, vec![Cell::Missing])]);
        assert!(matches!(
            five_number_summary(&ds, DISTANCE),
            Err(SurveyError::EmptyField(_))
        ));
    }

    #[test]
    fn test_quantile_edges() {
        let sorted = [1.0, 2.0, 4.0, 8.0];
        assert_eq!(quantile(&sorted, 0.0), 1.0);
        assert_eq!(quantile(&sorted, 1.0), 8.0);
        assert!((quantile(&sorted, 0.5) - 3.0).abs() < 1e-12);
        assert_eq!(quantile(&[7.0], 0.75), 7.0);
    }

    #[test]
    fn test_group_sums_strip_prefix() {
        let ds = fixture();
        let fields = ds.columns_with_prefix(DISTRICT_PREFIX);
        let sums = group_sums(&ds, &fields, DISTRICT_PREFIX).unwrap();

        let by_name: BTreeMap<&str, f64> =
            sums.iter().map(|s| (s.group.as_str(), s.total)).collect();
        assert_eq!(by_name["Central and Western"], 3.0);
        assert_eq!(by_name["Islands"], 0.0);
        assert_eq!(by_name["Sha Tin"], 5.0);
        assert_eq!(by_name["Wan Chai"], 4.0);

        let total: f64 = sums.iter().map(|s| s.total).sum();
        assert!(total <= ds.row_count() as f64);
    }

    #[test]
    fn test_sort_groups_by_total() {
        let ds = fixture();
        let fields = ds.columns_with_prefix(DISTRICT_PREFIX);
        let mut sums = group_sums(&ds, &fields, DISTRICT_PREFIX).unwrap();

        sort_groups_by_total(&mut sums, true);
        let order: Vec<&str> = sums.iter().map(|s| s.group.as_str()).collect();
        assert_eq!(order, vec!["Sha Tin", "Wan Chai", "Central and Western", "Islands"]);
    }

    #[test]
    fn test_cross_tab_rows_sum_to_hundred() {
        let ds = fixture();
        let fields = ds.columns_with_prefix(DISTRICT_PREFIX);
        let tab = cross_tab_percentage(
            &ds,
            &fields,
            DISTRICT_PREFIX,
            FOOD_WASTE_BEHAVIOR,
            is_indicator_member,
        )
        .unwrap();

        assert_eq!(
            tab.behaviors,
            vec![
                "Compost at home".to_string(),
                "Dispose with general waste".to_string(),
                "Separate for collection".to_string(),
            ]
        );
        for row in &tab.rows {
            assert!((row.percentage_total() - 100.0).abs() < 1e-9, "{}", row.group);
        }
        assert_eq!(tab.percentage("Sha Tin", "Compost at home"), Some(40.0));
        assert_eq!(tab.percentage("Wan Chai", "Separate for collection"), Some(50.0));
        assert_eq!(tab.percentage("Central and Western", "Compost at home"), Some(0.0));
    }

    #[test]
    fn test_cross_tab_omits_empty_group() {
        let ds = fixture();
        let fields = ds.columns_with_prefix(DISTRICT_PREFIX);
        let tab = cross_tab_percentage(
            &ds,
            &fields,
            DISTRICT_PREFIX,
            FOOD_WASTE_BEHAVIOR,
            is_indicator_member,
        )
        .unwrap();

        assert!(tab.rows.iter().all(|r| r.group != "Islands"));
        assert_eq!(tab.empty_groups, vec!["Islands".to_string()]);
        assert!(matches!(tab.row("Islands"), Err(SurveyError::EmptyGroup(_))));
    }

    #[test]
    fn test_pearson_symmetric_and_bounded() {
        let ds = fixture();
        let ab = pearson_correlation(&ds, DISTANCE, RECYCLING_EFFORT).unwrap().unwrap();
        let ba = pearson_correlation(&ds, RECYCLING_EFFORT, DISTANCE).unwrap().unwrap();

        assert!((ab - ba).abs() < 1e-12);
        assert!((-1.0..=1.0).contains(&ab));
        assert!(ab < 0.0);
    }

    #[test]
    fn test_pearson_drops_incomplete_pairs() {
        let ds = Dataset::new(
            "inline",
            vec![
                Column::new(
                    "a",
                    vec![Cell::Number(1.0), Cell::Number(2.0), Cell::Missing, Cell::Number(3.0)],
                ),
                Column::new(
                    "b",
                    vec![Cell::Number(2.0), Cell::Number(4.0), Cell::Number(100.0), Cell::Number(6.0)],
                ),
            ],
        );

        let r = pearson_correlation(&ds, "a", "b").unwrap().unwrap();
        assert!((r - 1.0).abs() < 1e-12);

        let fit = linear_fit(&ds, "a", "b").unwrap().unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!(fit.intercept.abs() < 1e-12);
        assert!((fit.predict(10.0) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_pearson_constant_field_is_undefined() {
        let ds = Dataset::new(
            "inline",
            vec![numbers("a", &[1.0, 1.0, 1.0]), numbers("b", &[1.0, 2.0, 3.0])],
        );
        assert_eq!(pearson_correlation(&ds, "a", "b").unwrap(), None);
        assert_eq!(linear_fit(&ds, "a", "b").unwrap(), None);
    }

    #[test]
    fn test_relationship_matches_parts() {
        let ds = fixture();
        let rel = relationship(&ds, DISTANCE, RECYCLING_EFFORT).unwrap();
        assert_eq!(rel.pairs, 12);
        assert_eq!(rel.correlation, pearson_correlation(&ds, DISTANCE, RECYCLING_EFFORT).unwrap());
        assert_eq!(rel.fit, linear_fit(&ds, DISTANCE, RECYCLING_EFFORT).unwrap());
    }

    #[test]
    fn test_histogram_counts() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 10.0];
        let bins = histogram(&values, 5).unwrap();

        assert_eq!(bins.edges.len(), 6);
        assert_eq!(bins.counts.iter().sum::<usize>(), values.len());
        assert_eq!(bins.counts, vec![2, 2, 1, 0, 1]);

        let flat = histogram(&[3.0, 3.0], 15).unwrap();
        assert_eq!(flat.edges[0], 2.5);
        assert_eq!(flat.counts.iter().sum::<usize>(), 2);
    }

    #[test]
    fn test_box_stats_outliers() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        let stats = box_stats(&values).unwrap();

        assert_eq!(stats.outliers, vec![100.0]);
        assert_eq!(stats.whisker_low, 1.0);
        assert_eq!(stats.whisker_high, 5.0);
        assert!(stats.whisker_low <= stats.q1 && stats.q3 <= stats.whisker_high);
    }

    #[test]
    fn test_mean_median_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), Some(5.0));
        assert_eq!(median(&values), Some(4.5));
        assert!((sample_std(&values).unwrap() - 2.138089935299395).abs() < 1e-12);
        assert_eq!(sample_std(&[1.0]), None);
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_shared_axis_max() {
        let ds = fixture();
        let before = frequency_table(&ds, SUPPORT_LEVEL, &SUPPORT_SCALE.domain()).unwrap();
        let after = frequency_table(&ds, "support_after_info", &SUPPORT_SCALE.domain()).unwrap();
        let expected = before.max_count().max(after.max_count()) + 5;
        assert_eq!(shared_axis_max(&[&before, &after]), expected);
    }
}
