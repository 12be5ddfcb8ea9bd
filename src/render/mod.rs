//! Chart rendering.
//!
//! Turns aggregate results into PNG files with fixed names under the
//! output directory. Files are overwritten on every run.

pub mod charts;
pub mod style;

use crate::analysis::{box_stats, histogram, mean, median};
use crate::error::{SurveyError, SurveyResult};
use crate::models::{
    ChartArtifact, CrossTab, FrequencyTable, GroupSum, LinearFit, Scale, DISTANCE, EFFORT_SCALE,
    SUPPORT_SCALE,
};
use charts::{BarPanel, DistancePanels, DrawResult, ScatterPlot};
use indicatif::{ProgressBar, ProgressStyle};
use plotters::style::RGBColor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::{Path, PathBuf};
use style::*;
use tracing::{debug, info};

/// Every chart the report can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    SupportBar,
    SupportPie,
    SupportComparison,
    LikertGrid,
    DistrictDistribution,
    FoodWasteByDistrict,
    DistanceAnalysis,
    DistanceScatter,
    DistanceRegplot,
}

impl ChartKind {
    #[allow(dead_code)] // Enumeration of every output file
    pub const ALL: [ChartKind; 9] = [
        ChartKind::SupportBar,
        ChartKind::SupportPie,
        ChartKind::SupportComparison,
        ChartKind::LikertGrid,
        ChartKind::DistrictDistribution,
        ChartKind::FoodWasteByDistrict,
        ChartKind::DistanceAnalysis,
        ChartKind::DistanceScatter,
        ChartKind::DistanceRegplot,
    ];

    /// Fixed file name inside the output directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            ChartKind::SupportBar => "support_level_bar_chart.png",
            ChartKind::SupportPie => "support_level_pie_chart.png",
            ChartKind::SupportComparison => "support_comparison.png",
            ChartKind::LikertGrid => "likert_variables.png",
            ChartKind::DistrictDistribution => "district_distribution.png",
            ChartKind::FoodWasteByDistrict => "food_waste_by_district.png",
            ChartKind::DistanceAnalysis => "distance_analysis.png",
            ChartKind::DistanceScatter => "distance_vs_recycling_scatter.png",
            ChartKind::DistanceRegplot => "distance_vs_recycling_regplot.png",
        }
    }

    /// Short identifier used in logs and the JSON summary.
    pub fn name(&self) -> &'static str {
        self.file_name().trim_end_matches(".png")
    }
}

/// Create `dir` if it is absent. Returns `true` when it was created.
pub fn ensure_output_dir(dir: &Path) -> SurveyResult<bool> {
    if dir.is_dir() {
        debug!("Output directory {} already exists", dir.display());
        return Ok(false);
    }

    fs::create_dir_all(dir).map_err(|source| SurveyError::OutputDir {
        path: dir.to_path_buf(),
        source,
    })?;
    info!("Created output directory {}", dir.display());
    Ok(true)
}

/// `n` uniform offsets in `[-amplitude, amplitude)` from a seeded generator.
pub fn jitter_offsets(n: usize, seed: u64, amplitude: f64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(-amplitude..amplitude)).collect()
}

/// Row-aligned points with the offset of each row added to `y`.
/// Rows missing either value are skipped.
pub fn jittered_points(xs: &[Option<f64>], ys: &[Option<f64>], offsets: &[f64]) -> Vec<(f64, f64)> {
    xs.iter()
        .zip(ys)
        .zip(offsets)
        .filter_map(|((x, y), dy)| Some(((*x)?, (*y)? + dy)))
        .collect()
}

/// Tick labels of a scale, one per level.
pub fn scale_labels(scale: &Scale, format: impl Fn(i64, &str) -> String) -> Vec<String> {
    scale
        .domain()
        .into_iter()
        .map(|level| format(level, scale.label(level).unwrap_or_default()))
        .collect()
}

fn bar_labels() -> Vec<String> {
    scale_labels(&SUPPORT_SCALE, |level, label| format!("{} {}", level, label))
}

fn effort_labels() -> Vec<String> {
    scale_labels(&EFFORT_SCALE, |level, label| format!("{} ({})", level, label))
}

fn table_values(table: &FrequencyTable) -> Vec<usize> {
    table.counts.iter().map(|c| c.count).collect()
}

/// Writes charts into one output directory and records what was written.
pub struct ChartRenderer {
    output_dir: PathBuf,
    progress: Option<ProgressBar>,
    artifacts: Vec<ChartArtifact>,
}

impl ChartRenderer {
    /// A renderer for `output_dir`, showing a progress bar of `expected`
    /// charts when `show_progress` is set.
    pub fn new(output_dir: impl Into<PathBuf>, expected: usize, show_progress: bool) -> Self {
        let progress = show_progress.then(|| {
            let pb = ProgressBar::new(expected as u64);
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .map(|s| s.progress_chars("#>-"))
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            pb.set_style(style);
            pb
        });

        Self {
            output_dir: output_dir.into(),
            progress,
            artifacts: Vec::new(),
        }
    }

    pub fn path_for(&self, kind: ChartKind) -> PathBuf {
        self.output_dir.join(kind.file_name())
    }

    /// Clear the progress bar and hand back the written charts.
    pub fn finish(self) -> Vec<ChartArtifact> {
        if let Some(pb) = &self.progress {
            pb.finish_and_clear();
        }
        self.artifacts
    }

    fn record(&mut self, kind: ChartKind, path: PathBuf, result: DrawResult) -> SurveyResult<PathBuf> {
        result.map_err(|e| SurveyError::Render {
            chart: kind.name().to_string(),
            message: e.to_string(),
        })?;

        info!("Saved: {}", path.display());
        if let Some(pb) = &self.progress {
            pb.set_message(kind.name());
            pb.inc(1);
        }
        self.artifacts.push(ChartArtifact {
            chart: kind.name().to_string(),
            path: path.display().to_string(),
        });
        Ok(path)
    }

    fn support_panel(table: &FrequencyTable, title: &str, y_max: usize, color: RGBColor) -> BarPanel {
        BarPanel {
            title: title.to_string(),
            x_desc: "Support Level".to_string(),
            y_desc: "Number of Respondents".to_string(),
            categories: bar_labels(),
            values: table_values(table),
            y_max,
            color,
        }
    }

    /// Bar chart of the support level counts.
    pub fn support_bar(&mut self, table: &FrequencyTable) -> SurveyResult<PathBuf> {
        let kind = ChartKind::SupportBar;
        let path = self.path_for(kind);
        let y_max = table.max_count() + 1;
        let panel = Self::support_panel(table, SUPPORT_TITLE, y_max, STEELBLUE);
        let result = charts::bar_chart(&path, BAR_SIZE, &panel);
        self.record(kind, path, result)
    }

    /// Pie chart of the support level counts.
    pub fn support_pie(&mut self, table: &FrequencyTable) -> SurveyResult<PathBuf> {
        let kind = ChartKind::SupportPie;
        let path = self.path_for(kind);
        let labels = scale_labels(&SUPPORT_SCALE, |level, label| format!("{}: {}", level, label));
        let result = charts::pie_chart(&path, PIE_SIZE, SUPPORT_TITLE, &labels, &table_values(table), &BLUES);
        self.record(kind, path, result)
    }

    /// Before and after information side by side on a shared y axis.
    pub fn support_comparison(
        &mut self,
        before: &FrequencyTable,
        after: &FrequencyTable,
        y_max: usize,
    ) -> SurveyResult<PathBuf> {
        let kind = ChartKind::SupportComparison;
        let path = self.path_for(kind);
        let panels = [
            Self::support_panel(before, "Support Level (Before Information)", y_max, STEELBLUE),
            Self::support_panel(after, "Support Level (After Information)", y_max, CORAL),
        ];
        let result = charts::bar_grid(&path, COMPARISON_SIZE, (1, 2), &panels);
        self.record(kind, path, result)
    }

    /// 2x2 grid of attitude fields, given as `(table, panel title)`.
    pub fn likert_grid(&mut self, tables: &[(FrequencyTable, &str)], y_max: usize) -> SurveyResult<PathBuf> {
        let kind = ChartKind::LikertGrid;
        let path = self.path_for(kind);
        let panels: Vec<BarPanel> = tables
            .iter()
            .enumerate()
            .map(|(i, (table, title))| BarPanel {
                title: title.to_string(),
                x_desc: "Rating".to_string(),
                y_desc: "Count".to_string(),
                categories: bar_labels(),
                values: table_values(table),
                y_max,
                color: SET2[i % SET2.len()],
            })
            .collect();
        let result = charts::bar_grid(&path, GRID_SIZE, (2, 2), &panels);
        self.record(kind, path, result)
    }

    /// Horizontal bars of respondents per district, largest on top.
    pub fn district_distribution(&mut self, sums: &[GroupSum]) -> SurveyResult<PathBuf> {
        let kind = ChartKind::DistrictDistribution;
        let path = self.path_for(kind);

        let mut sorted = sums.to_vec();
        crate::analysis::sort_groups_by_total(&mut sorted, false);
        let entries: Vec<(String, f64)> = sorted.into_iter().map(|g| (g.group, g.total)).collect();

        let result = charts::horizontal_bar_chart(
            &path,
            DISTRICT_SIZE,
            "Living District Distribution of Respondents",
            "Number of Respondents",
            "District",
            &entries,
        );
        self.record(kind, path, result)
    }

    /// Grouped percentage bars of food-waste behaviour per district.
    pub fn food_waste_by_district(&mut self, tab: &CrossTab) -> SurveyResult<PathBuf> {
        let kind = ChartKind::FoodWasteByDistrict;
        let path = self.path_for(kind);
        let result = charts::grouped_bar_chart(&path, CROSS_TAB_SIZE, "Food Waste Behavior by District", tab);
        self.record(kind, path, result)
    }

    /// Box plot and histogram of the distance values.
    pub fn distance_analysis(&mut self, values: &[f64]) -> SurveyResult<PathBuf> {
        let kind = ChartKind::DistanceAnalysis;
        let path = self.path_for(kind);
        let empty = || SurveyError::EmptyField(DISTANCE.to_string());

        let box_stats = box_stats(values).ok_or_else(empty)?;
        let bins = histogram(values, HISTOGRAM_BINS).ok_or_else(empty)?;
        let panels = DistancePanels {
            box_stats: &box_stats,
            bins: &bins,
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean: mean(values).ok_or_else(empty)?,
            median: median(values).ok_or_else(empty)?,
        };

        let result = charts::distance_chart(&path, DISTANCE_SIZE, &panels);
        self.record(kind, path, result)
    }

    /// Jittered scatter of distance against effort with the trend line.
    pub fn distance_scatter(&mut self, points: &[(f64, f64)], fit: Option<LinearFit>) -> SurveyResult<PathBuf> {
        let kind = ChartKind::DistanceScatter;
        let path = self.path_for(kind);
        let y_labels = effort_labels();
        let plot = ScatterPlot {
            title: RELATIONSHIP_TITLE,
            points,
            fit,
            fit_label: Some("Trend line"),
            y_labels: &y_labels,
            alpha: 0.6,
        };
        let result = charts::scatter_chart(&path, SCATTER_SIZE, &plot);
        self.record(kind, path, result)
    }

    /// The same relationship drawn as a regression plot.
    pub fn distance_regplot(&mut self, points: &[(f64, f64)], fit: Option<LinearFit>) -> SurveyResult<PathBuf> {
        let kind = ChartKind::DistanceRegplot;
        let path = self.path_for(kind);
        let title = format!("{} (with Regression Line)", RELATIONSHIP_TITLE);
        let y_labels = effort_labels();
        let plot = ScatterPlot {
            title: &title,
            points,
            fit,
            fit_label: None,
            y_labels: &y_labels,
            alpha: 0.5,
        };
        let result = charts::scatter_chart(&path, SCATTER_SIZE, &plot);
        self.record(kind, path, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_names_are_unique() {
        let mut names: Vec<&str> = ChartKind::ALL.iter().map(|k| k.file_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 9);
        assert!(names.iter().all(|n| n.ends_with(".png")));
        assert_eq!(ChartKind::DistanceRegplot.name(), "distance_vs_recycling_regplot");
    }

    #[test]
    fn test_ensure_output_dir() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("plots");

        assert!(ensure_output_dir(&dir).unwrap());
        assert!(dir.is_dir());
        assert!(!ensure_output_dir(&dir).unwrap());
    }

    #[test]
    fn test_ensure_output_dir_blocked_by_file() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("plots");
        fs::write(&blocker, b"not a directory").unwrap();

        assert!(matches!(
            ensure_output_dir(&blocker),
            Err(SurveyError::OutputDir { .. })
        ));
    }

    #[test]
    fn test_jitter_is_seeded_and_bounded() {
        let a = jitter_offsets(50, JITTER_SEED, JITTER_AMPLITUDE);
        let b = jitter_offsets(50, JITTER_SEED, JITTER_AMPLITUDE);
        assert_eq!(a, b);
        assert_eq!(a.len(), 50);
        assert!(a.iter().all(|v| (-0.2..0.2).contains(v)));
        assert_ne!(a, jitter_offsets(50, 7, JITTER_AMPLITUDE));
    }

    #[test]
    fn test_jittered_points_skip_missing_rows() {
        let xs = [Some(10.0), None, Some(30.0)];
        let ys = [Some(1.0), Some(2.0), Some(3.0)];
        let offsets = [0.1, 0.2, -0.1];

        let points = jittered_points(&xs, &ys, &offsets);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].0, 10.0);
        assert!((points[0].1 - 1.1).abs() < 1e-12);
        assert!((points[1].1 - 2.9).abs() < 1e-12);
    }

    #[test]
    fn test_scale_labels() {
        assert_eq!(effort_labels(), vec!["1 (Low)", "2 (Medium)", "3 (High)"]);
        assert_eq!(bar_labels()[4], "5 Strongly support");
        let pie = scale_labels(&SUPPORT_SCALE, |level, label| format!("{}: {}", level, label));
        assert_eq!(pie[0], "1: Strongly oppose");
    }

    #[test]
    fn test_renderer_writes_every_chart() {
        use crate::analysis::{
            cross_tab_percentage, frequency_table, group_sums, is_indicator_member, relationship,
            shared_axis_max,
        };
        use crate::dataset::{Dataset, ValidationPolicy};
        use crate::models::{
            ATTITUDE_FIELDS, DISTRICT_PREFIX, FOOD_WASTE_BEHAVIOR, RECYCLING_EFFORT,
            SUPPORT_AFTER_INFO, SUPPORT_LEVEL,
        };

        const SAMPLE: &str = include_str!("../../fixtures/survey_sample.csv");
        let ds = Dataset::from_reader(SAMPLE.as_bytes(), "fixture", &ValidationPolicy::default()).unwrap();
        let temp = TempDir::new().unwrap();
        let mut renderer = ChartRenderer::new(temp.path(), 9, false);

        let domain = SUPPORT_SCALE.domain();
        let before = frequency_table(&ds, SUPPORT_LEVEL, &domain).unwrap();
        let after = frequency_table(&ds, SUPPORT_AFTER_INFO, &domain).unwrap();
        let attitudes: Vec<(FrequencyTable, &str)> = ATTITUDE_FIELDS
            .iter()
            .map(|(field, title)| (frequency_table(&ds, field, &domain).unwrap(), *title))
            .collect();
        let fields = ds.columns_with_prefix(DISTRICT_PREFIX);
        let sums = group_sums(&ds, &fields, DISTRICT_PREFIX).unwrap();
        let tab = cross_tab_percentage(&ds, &fields, DISTRICT_PREFIX, FOOD_WASTE_BEHAVIOR, is_indicator_member)
            .unwrap();
        let rel = relationship(&ds, DISTANCE, RECYCLING_EFFORT).unwrap();
        let offsets = jitter_offsets(ds.row_count(), JITTER_SEED, JITTER_AMPLITUDE);
        let points = jittered_points(
            &ds.numeric(DISTANCE).unwrap(),
            &ds.numeric(RECYCLING_EFFORT).unwrap(),
            &offsets,
        );

        renderer.support_bar(&before).unwrap();
        renderer.support_pie(&before).unwrap();
        renderer
            .support_comparison(&before, &after, shared_axis_max(&[&before, &after]))
            .unwrap();
        let tables: Vec<&FrequencyTable> = attitudes.iter().map(|(t, _)| t).collect();
        renderer.likert_grid(&attitudes, shared_axis_max(&tables)).unwrap();
        renderer.district_distribution(&sums).unwrap();
        renderer.food_waste_by_district(&tab).unwrap();
        renderer
            .distance_analysis(&ds.column(DISTANCE).unwrap().present_values())
            .unwrap();
        renderer.distance_scatter(&points, rel.fit).unwrap();
        renderer.distance_regplot(&points, rel.fit).unwrap();

        let artifacts = renderer.finish();
        assert_eq!(artifacts.len(), 9);
        for kind in ChartKind::ALL {
            let meta = fs::metadata(temp.path().join(kind.file_name())).unwrap();
            assert!(meta.len() > 0, "{} is empty", kind.file_name());
        }
    }

    #[test]
    fn test_distance_analysis_rejects_empty_values() {
        let temp = TempDir::new().unwrap();
        let mut renderer = ChartRenderer::new(temp.path(), 1, false);
        assert!(matches!(
            renderer.distance_analysis(&[]),
            Err(SurveyError::EmptyField(_))
        ));
        assert!(renderer.finish().is_empty());
    }

    #[test]
    fn test_renderer_paths() {
        let renderer = ChartRenderer::new("plots", 9, false);
        assert_eq!(
            renderer.path_for(ChartKind::LikertGrid),
            PathBuf::from("plots").join("likert_variables.png")
        );
        assert!(renderer.finish().is_empty());
    }
}
