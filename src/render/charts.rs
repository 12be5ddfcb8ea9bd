//! Chart drawing with plotters.
//!
//! Each function draws one complete PNG. Categorical axes use `f64`
//! coordinates with one unit per category, labelled through a formatter.

use super::style::*;
use crate::models::{BoxStats, CrossTab, HistogramBins, LinearFit};
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use std::error::Error;
use std::path::Path;

pub type DrawResult = Result<(), Box<dyn Error>>;

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// One vertical bar panel.
#[derive(Debug, Clone)]
pub struct BarPanel {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub categories: Vec<String>,
    pub values: Vec<usize>,
    pub y_max: usize,
    pub color: RGBColor,
}

/// Label of the category at integer position `v`, empty between categories.
pub fn category_label(labels: &[String], v: f64) -> String {
    let idx = v.round();
    if (v - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

/// Whole-number tick label for a count axis, empty at fractional ticks.
pub fn count_label(v: f64) -> String {
    if v.fract().abs() > 1e-9 {
        return String::new();
    }
    format!("{:.0}", v)
}

fn outline() -> ShapeStyle {
    BLACK.stroke_width(1)
}

fn draw_bar_panel(area: &Area<'_>, panel: &BarPanel) -> DrawResult {
    let n = panel.values.len().max(1) as f64;
    let y_max = panel.y_max.max(1) as f64;

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, ("sans-serif", TITLE_FONT))
        .margin(20)
        .x_label_area_size(70)
        .y_label_area_size(80)
        .build_cartesian_2d(-0.5f64..(n - 0.5), 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(panel.values.len())
        .x_label_formatter(&|x| category_label(&panel.categories, *x))
        .y_label_formatter(&|y| count_label(*y))
        .x_desc(panel.x_desc.as_str())
        .y_desc(panel.y_desc.as_str())
        .axis_desc_style(("sans-serif", LABEL_FONT))
        .label_style(("sans-serif", TICK_FONT))
        .draw()?;

    let bars = || {
        panel
            .values
            .iter()
            .enumerate()
            .map(|(i, &v)| [(i as f64 - BAR_HALF_WIDTH, 0.0), (i as f64 + BAR_HALF_WIDTH, v as f64)])
    };
    chart.draw_series(bars().map(|r| Rectangle::new(r, panel.color.filled())))?;
    chart.draw_series(bars().map(|r| Rectangle::new(r, outline())))?;

    Ok(())
}

/// A single bar chart.
pub fn bar_chart(path: &Path, size: (u32, u32), panel: &BarPanel) -> DrawResult {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    draw_bar_panel(&root, panel)?;
    root.present()?;
    Ok(())
}

/// Bar panels laid out on a `rows x cols` grid.
pub fn bar_grid(path: &Path, size: (u32, u32), layout: (usize, usize), panels: &[BarPanel]) -> DrawResult {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    for (area, panel) in root.split_evenly(layout).iter().zip(panels) {
        draw_bar_panel(area, panel)?;
    }

    root.present()?;
    Ok(())
}

/// Pie chart with percentage labels, starting at twelve o'clock.
pub fn pie_chart(
    path: &Path,
    size: (u32, u32),
    title: &str,
    labels: &[String],
    values: &[usize],
    colors: &[RGBColor],
) -> DrawResult {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let area = root.titled(title, ("sans-serif", TITLE_FONT))?;

    let sizes: Vec<f64> = values.iter().map(|&v| v as f64).collect();
    if sizes.iter().sum::<f64>() > 0.0 {
        let (w, h) = area.dim_in_pixel();
        let center = ((w / 2) as i32, (h / 2) as i32);
        let radius = w.min(h) as f64 * 0.33;
        let colors: Vec<RGBColor> = (0..sizes.len()).map(|i| colors[i % colors.len()]).collect();

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, labels);
        pie.start_angle(-90.0);
        pie.label_style(("sans-serif", LABEL_FONT).into_font().color(&BLACK));
        pie.percentages(("sans-serif", TICK_FONT).into_font().color(&BLACK));
        area.draw(&pie)?;
    }

    root.present()?;
    Ok(())
}

/// Horizontal bars, first entry at the bottom.
pub fn horizontal_bar_chart(
    path: &Path,
    size: (u32, u32),
    title: &str,
    x_desc: &str,
    y_desc: &str,
    entries: &[(String, f64)],
) -> DrawResult {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let labels: Vec<String> = entries.iter().map(|(name, _)| name.clone()).collect();
    let n = entries.len().max(1) as f64;
    let x_max = entries.iter().map(|(_, v)| *v).fold(0.0, f64::max).max(1.0) * 1.05;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", TITLE_FONT))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(260)
        .build_cartesian_2d(0f64..x_max, -0.5f64..(n - 0.5))?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(entries.len())
        .y_label_formatter(&|y| category_label(&labels, *y))
        .x_desc(x_desc)
        .y_desc(y_desc)
        .axis_desc_style(("sans-serif", LABEL_FONT))
        .label_style(("sans-serif", TICK_FONT))
        .draw()?;

    let bars = || {
        entries
            .iter()
            .enumerate()
            .map(|(i, (_, v))| [(0.0, i as f64 - BAR_HALF_WIDTH), (*v, i as f64 + BAR_HALF_WIDTH)])
    };
    chart.draw_series(bars().map(|r| Rectangle::new(r, STEELBLUE.filled())))?;
    chart.draw_series(bars().map(|r| Rectangle::new(r, outline())))?;

    root.present()?;
    Ok(())
}

/// Grouped percentage bars: one cluster per cross-tab row, one bar per behaviour.
pub fn grouped_bar_chart(path: &Path, size: (u32, u32), title: &str, tab: &CrossTab) -> DrawResult {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let groups: Vec<String> = tab.rows.iter().map(|r| r.group.clone()).collect();
    let n = groups.len().max(1) as f64;
    let m = tab.behaviors.len().max(1) as f64;
    let width = 2.0 * BAR_HALF_WIDTH / m;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", TITLE_FONT))
        .margin(20)
        .x_label_area_size(200)
        .y_label_area_size(80)
        .build_cartesian_2d(-0.5f64..(n - 0.5), 0f64..105f64)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(groups.len())
        .x_label_formatter(&|x| category_label(&groups, *x))
        .y_label_formatter(&|y| count_label(*y))
        .x_desc("District")
        .y_desc("Percentage of Respondents (%)")
        .axis_desc_style(("sans-serif", LABEL_FONT))
        .label_style(("sans-serif", TICK_FONT))
        // Must follow label_style, which resets both axes.
        .x_label_style(
            ("sans-serif", TICK_FONT)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .draw()?;

    for (j, behavior) in tab.behaviors.iter().enumerate() {
        let color = SET2[j % SET2.len()];
        let bars = || {
            tab.rows.iter().enumerate().map(move |(i, row)| {
                let x0 = i as f64 - BAR_HALF_WIDTH + j as f64 * width;
                [(x0, 0.0), (x0 + width, row.percentages[j])]
            })
        };
        chart
            .draw_series(bars().map(|r| Rectangle::new(r, color.filled())))?
            .label(behavior.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 14, y + 6)], color.filled()));
        chart.draw_series(bars().map(|r| Rectangle::new(r, outline())))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .label_font(("sans-serif", TICK_FONT))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

fn draw_box_panel(area: &Area<'_>, stats: &BoxStats, min: f64, max: f64, y_desc: &str) -> DrawResult {
    let pad = ((max - min) * 0.05).max(1.0);
    let labels = vec![String::new(), "Distance".to_string()];

    let mut chart = ChartBuilder::on(area)
        .caption("Box-Whisker Plot of Distance_artificial", ("sans-serif", TITLE_FONT))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(90)
        .build_cartesian_2d(0f64..2f64, (min - pad)..(max + pad))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(3)
        .x_label_formatter(&|x| category_label(&labels, *x))
        .y_desc(y_desc)
        .axis_desc_style(("sans-serif", LABEL_FONT))
        .label_style(("sans-serif", TICK_FONT))
        .draw()?;

    let (left, right) = (1.0 - BOX_HALF_WIDTH, 1.0 + BOX_HALF_WIDTH);
    let (cap_left, cap_right) = (1.0 - BOX_HALF_WIDTH / 2.0, 1.0 + BOX_HALF_WIDTH / 2.0);

    chart.draw_series(std::iter::once(Rectangle::new(
        [(left, stats.q1), (right, stats.q3)],
        LIGHTBLUE.filled(),
    )))?;
    chart.draw_series(std::iter::once(Rectangle::new(
        [(left, stats.q1), (right, stats.q3)],
        outline(),
    )))?;

    let segments = [
        vec![(1.0, stats.q3), (1.0, stats.whisker_high)],
        vec![(1.0, stats.q1), (1.0, stats.whisker_low)],
        vec![(cap_left, stats.whisker_high), (cap_right, stats.whisker_high)],
        vec![(cap_left, stats.whisker_low), (cap_right, stats.whisker_low)],
    ];
    chart.draw_series(segments.into_iter().map(|s| PathElement::new(s, BLACK)))?;
    chart.draw_series(std::iter::once(PathElement::new(
        vec![(left, stats.median), (right, stats.median)],
        RED.stroke_width(3),
    )))?;
    chart.draw_series(
        stats
            .outliers
            .iter()
            .map(|&v| Circle::new((1.0, v), 6, FLIER_GRAY.filled())),
    )?;

    Ok(())
}

fn draw_histogram_panel(area: &Area<'_>, bins: &HistogramBins, mean: f64, median: f64, x_desc: &str) -> DrawResult {
    let lo = bins.edges.first().copied().unwrap_or(0.0);
    let hi = bins.edges.last().copied().unwrap_or(1.0);
    let y_max = bins.counts.iter().copied().max().unwrap_or(0) as f64 * 1.1 + 1.0;

    let mut chart = ChartBuilder::on(area)
        .caption("Histogram of Distance_artificial", ("sans-serif", TITLE_FONT))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(lo..hi, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc("Frequency")
        .y_label_formatter(&|y| count_label(*y))
        .axis_desc_style(("sans-serif", LABEL_FONT))
        .label_style(("sans-serif", TICK_FONT))
        .draw()?;

    let bars = || {
        bins.counts
            .iter()
            .zip(bins.edges.windows(2))
            .map(|(&c, edge)| [(edge[0], 0.0), (edge[1], c as f64)])
    };
    chart.draw_series(bars().map(|r| Rectangle::new(r, STEELBLUE.mix(0.7).filled())))?;
    chart.draw_series(bars().map(|r| Rectangle::new(r, outline())))?;

    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(mean, 0.0), (mean, y_max)],
            RED.stroke_width(2),
        )))?
        .label(format!("Mean: {:.1}m", mean))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));
    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(median, 0.0), (median, y_max)],
            GREEN.stroke_width(2),
        )))?
        .label(format!("Median: {:.1}m", median))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], GREEN.stroke_width(2)));

    chart
        .configure_series_labels()
        .label_font(("sans-serif", TICK_FONT))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

/// Inputs of the box-plot and histogram figure.
#[derive(Debug, Clone)]
pub struct DistancePanels<'a> {
    pub box_stats: &'a BoxStats,
    pub bins: &'a HistogramBins,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

/// Box-and-whisker plot beside a histogram with mean and median lines.
pub fn distance_chart(path: &Path, size: (u32, u32), panels: &DistancePanels<'_>) -> DrawResult {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let areas = root.split_evenly((1, 2));
    draw_box_panel(&areas[0], panels.box_stats, panels.min, panels.max, DISTANCE_DESC)?;
    draw_histogram_panel(&areas[1], panels.bins, panels.mean, panels.median, DISTANCE_DESC)?;

    root.present()?;
    Ok(())
}

/// Inputs of a jittered scatter with an optional fitted line.
#[derive(Debug, Clone)]
pub struct ScatterPlot<'a> {
    pub title: &'a str,
    pub points: &'a [(f64, f64)],
    pub fit: Option<LinearFit>,
    pub fit_label: Option<&'a str>,
    pub y_labels: &'a [String],
    pub alpha: f64,
}

/// Scatter of distance against jittered effort, with the trend line overlaid.
pub fn scatter_chart(path: &Path, size: (u32, u32), plot: &ScatterPlot<'_>) -> DrawResult {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let (x_lo, x_hi) = plot
        .points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.0), hi.max(p.0)));
    let (x_lo, x_hi) = if x_lo.is_finite() { (x_lo, x_hi) } else { (0.0, 1.0) };
    let pad = ((x_hi - x_lo) * 0.05).max(1.0);
    let y_top = plot.y_labels.len() as f64 + 0.5;

    let mut chart = ChartBuilder::on(&root)
        .caption(plot.title, ("sans-serif", TITLE_FONT))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(120)
        .build_cartesian_2d((x_lo - pad)..(x_hi + pad), 0.5f64..y_top)?;

    // Level k sits at y == k, so label index k - 1.
    let level_label = |y: f64| category_label(plot.y_labels, y - 1.0);
    chart
        .configure_mesh()
        .y_labels(plot.y_labels.len() * 2 + 1)
        .y_label_formatter(&|y| level_label(*y))
        .x_desc(DISTANCE_DESC)
        .y_desc("Recycling Effort Level")
        .axis_desc_style(("sans-serif", LABEL_FONT))
        .label_style(("sans-serif", TICK_FONT))
        .draw()?;

    chart.draw_series(
        plot.points
            .iter()
            .map(|&p| Circle::new(p, 6, STEELBLUE.mix(plot.alpha).filled())),
    )?;

    if let Some(fit) = plot.fit {
        let steps = 100;
        let line = (0..=steps).map(|i| {
            let x = x_lo + (x_hi - x_lo) * i as f64 / steps as f64;
            (x, fit.predict(x))
        });
        let series = chart.draw_series(LineSeries::new(line, RED.stroke_width(3)))?;
        if let Some(label) = plot.fit_label {
            series
                .label(label)
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(3)));
            chart
                .configure_series_labels()
                .label_font(("sans-serif", TICK_FONT))
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }
    }

    root.present()?;
    Ok(())
}
