//! Console report generation.
//!
//! Every function returns a finished block of text. Numbers use fixed
//! precision so two runs over the same file print the same bytes.

use crate::dataset::Dataset;
use crate::models::{
    CategoricalStats, ColumnInfo, ColumnStats, CrossTab, FrequencyTable, GroupSum,
    Relationship, Scale, SurveySummary,
};
use crate::scanner::ScannedFile;
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;

const BANNER_WIDTH: usize = 70;
const RULE_WIDTH: usize = 60;

/// Section heading framed by `=` rules.
pub fn section_banner(title: &str) -> String {
    let rule = "=".repeat(BANNER_WIDTH);
    format!("\n{}\n{}\n{}\n", rule, title, rule)
}

fn heading(title: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!("{}\n{}\n{}\n", rule, title, rule)
}

/// Integral values without decimals, everything else with `precision`.
pub fn format_number(value: f64, precision: usize) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.*}", precision, value)
    }
}

/// Aligned text table. The first column is left-aligned, the rest right-aligned.
fn format_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = (0..headers.len())
        .map(|i| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(|c| c.chars().count())
                .chain(std::iter::once(headers[i].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let render_row = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, w))| {
                if i == 0 {
                    format!("{:<w$}", cell, w = *w)
                } else {
                    format!("{:>w$}", cell, w = *w)
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = render_row(headers);
    out.push('\n');
    for row in rows {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out
}

/// Row count and column count after loading.
pub fn format_shape(dataset: &Dataset) -> String {
    let (rows, cols) = dataset.shape();
    format!("Dataset loaded: {} rows, {} columns\n", rows, cols)
}

/// The first `n` rows with a positional index.
pub fn format_head(dataset: &Dataset, n: usize) -> String {
    let headers: Vec<String> = std::iter::once(String::new())
        .chain(dataset.column_names().map(String::from))
        .collect();
    let rows: Vec<Vec<String>> = dataset
        .head(n)
        .into_iter()
        .enumerate()
        .map(|(i, cells)| {
            std::iter::once(i.to_string())
                .chain(cells.into_iter().map(|c| c.to_string()))
                .collect()
        })
        .collect();

    format!("First {} rows:\n{}", rows.len(), format_table(&headers, &rows))
}

/// Per-column non-null counts and kinds, followed by a kind tally.
pub fn format_info(infos: &[ColumnInfo], rows: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "RangeIndex: {} entries, 0 to {}\n",
        rows,
        rows.saturating_sub(1)
    ));
    out.push_str(&format!("Data columns (total {} columns):\n", infos.len()));

    let headers: Vec<String> = ["#", "Column", "Non-Null Count", "Dtype"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let table_rows: Vec<Vec<String>> = infos
        .iter()
        .enumerate()
        .map(|(i, info)| {
            vec![
                i.to_string(),
                info.name.clone(),
                format!("{} non-null", info.non_null),
                info.kind.to_string(),
            ]
        })
        .collect();
    out.push_str(&format_table(&headers, &table_rows));

    let mut kinds: BTreeMap<String, usize> = BTreeMap::new();
    for info in infos {
        *kinds.entry(info.kind.to_string()).or_insert(0) += 1;
    }
    let tally: Vec<String> = kinds.iter().map(|(k, n)| format!("{}({})", k, n)).collect();
    out.push_str(&format!("dtypes: {}\n", tally.join(", ")));
    out
}

fn stats_row(stats: &ColumnStats) -> Vec<String> {
    let s = &stats.summary;
    vec![
        stats.column.clone(),
        stats.count.to_string(),
        format!("{:.2}", stats.mean),
        stats
            .std
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "NaN".to_string()),
        format!("{:.2}", s.min),
        format!("{:.2}", s.q1),
        format!("{:.2}", s.median),
        format!("{:.2}", s.q3),
        format!("{:.2}", s.max),
    ]
}

/// Describe table of numeric columns, one row per column.
pub fn format_numeric_describe(stats: &[ColumnStats]) -> String {
    if stats.is_empty() {
        return "No numeric columns.\n".to_string();
    }

    let headers: Vec<String> = ["column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let rows: Vec<Vec<String>> = stats.iter().map(stats_row).collect();
    format_table(&headers, &rows)
}

/// Describe table of categorical columns.
pub fn format_categorical_describe(stats: &[CategoricalStats]) -> String {
    if stats.is_empty() {
        return "No categorical columns.\n".to_string();
    }

    let headers: Vec<String> = ["column", "count", "unique", "top", "freq"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let rows: Vec<Vec<String>> = stats
        .iter()
        .map(|s| {
            vec![
                s.column.clone(),
                s.count.to_string(),
                s.unique.to_string(),
                s.top.clone().unwrap_or_else(|| "NaN".to_string()),
                s.freq.to_string(),
            ]
        })
        .collect();
    format_table(&headers, &rows)
}

/// Numbered list of column names.
pub fn format_column_list(infos: &[ColumnInfo]) -> String {
    let mut out = format!("Columns ({}):\n", infos.len());
    for (i, info) in infos.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, info.name));
    }
    out
}

/// Counts per level with the scale's labels.
pub fn format_frequency_table(table: &FrequencyTable, scale: &Scale) -> String {
    let mut out = heading(&format!("Frequency Table for {}:", table.field));
    for entry in &table.counts {
        out.push_str(&format!(
            "  {} ({}): {}\n",
            entry.level,
            scale.label(entry.level).unwrap_or("?"),
            entry.count
        ));
    }
    if table.unmatched > 0 {
        out.push_str(&format!(
            "  outside {}: {}\n",
            scale.describe_domain(),
            table.unmatched
        ));
    }
    out
}

/// Respondents per district, largest first.
pub fn format_district_distribution(sums: &[GroupSum]) -> String {
    let mut sorted = sums.to_vec();
    crate::analysis::sort_groups_by_total(&mut sorted, true);

    let mut out = format!("Number of district columns: {}\n\n", sums.len());
    out.push_str(&heading("District Distribution of Respondents:"));
    let width = sorted.iter().map(|g| g.group.chars().count()).max().unwrap_or(0);
    for g in &sorted {
        out.push_str(&format!(
            "{:<w$}  {:>6}\n",
            g.group,
            format_number(g.total, 1),
            w = width
        ));
    }
    out
}

/// Behaviour percentages per district, one decimal.
pub fn format_cross_tab(tab: &CrossTab) -> String {
    let mut out = heading("Cross Table: Food Waste Behavior by District");

    if tab.rows.is_empty() {
        out.push_str("No district has any respondents.\n");
    } else {
        let headers: Vec<String> = std::iter::once("District".to_string())
            .chain(tab.behaviors.iter().cloned())
            .collect();
        let rows: Vec<Vec<String>> = tab
            .rows
            .iter()
            .map(|row| {
                std::iter::once(row.group.clone())
                    .chain(row.percentages.iter().map(|p| format!("{:.1}", p)))
                    .collect()
            })
            .collect();
        out.push_str(&format_table(&headers, &rows));
    }

    if !tab.empty_groups.is_empty() {
        out.push_str(&format!(
            "Omitted (no respondents): {}\n",
            tab.empty_groups.join(", ")
        ));
    }
    out
}

/// Describe block and five-number summary of the distance field.
pub fn format_distance_summary(stats: &ColumnStats) -> String {
    let s = &stats.summary;
    let mut out = heading(&format!("Summary Statistics for {} (meters):", stats.column));

    let std = stats
        .std
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "NaN".to_string());
    let lines = [
        ("count", stats.count.to_string()),
        ("mean", format!("{:.2}", stats.mean)),
        ("std", std),
        ("min", format!("{:.2}", s.min)),
        ("25%", format!("{:.2}", s.q1)),
        ("50%", format!("{:.2}", s.median)),
        ("75%", format!("{:.2}", s.q3)),
        ("max", format!("{:.2}", s.max)),
    ];
    for (name, value) in lines {
        out.push_str(&format!("{:<6}{:>12}\n", name, value));
    }

    out.push_str(&format!("\n{}\nFive-Number Summary:\n", "-".repeat(40)));
    out.push_str(&format!("  Minimum:   {:.2}\n", s.min));
    out.push_str(&format!("  Q1 (25%):  {:.2}\n", s.q1));
    out.push_str(&format!("  Median:    {:.2}\n", s.median));
    out.push_str(&format!("  Q3 (75%):  {:.2}\n", s.q3));
    out.push_str(&format!("  Maximum:   {:.2}\n", s.max));
    out
}

/// Pearson coefficient with four decimals.
pub fn format_correlation(relationship: &Relationship) -> String {
    let mut out = match relationship.correlation {
        Some(r) => format!("Correlation coefficient (Pearson): {:.4}\n", r),
        None => "Correlation coefficient (Pearson): undefined\n".to_string(),
    };
    if let Some(fit) = relationship.fit {
        out.push_str(&format!(
            "Trend line: {} = {:.4} * {} + {:.4} ({} pairs)\n",
            relationship.y_field, fit.slope, relationship.x_field, fit.intercept, relationship.pairs
        ));
    }
    out
}

/// Files in the output directory with sizes in KB.
pub fn format_output_listing(dir: &Path, files: Option<&[ScannedFile]>) -> String {
    let mut out = heading(&format!("Files in the '{}' directory:", dir.display()));
    match files {
        None => out.push_str(&format!("Directory '{}' does not exist.\n", dir.display())),
        Some([]) => out.push_str("No files found. Run the chart sections to generate plots.\n"),
        Some(files) => {
            for (i, file) in files.iter().enumerate() {
                out.push_str(&format!(
                    "{}. {} ({:.1} KB)\n",
                    i + 1,
                    file.name,
                    file.size_kb()
                ));
            }
        }
    }
    out
}

/// Generate the JSON summary document.
pub fn generate_json_summary(summary: &SurveySummary) -> Result<String> {
    serde_json::to_string_pretty(summary).map_err(Into::into)
}
