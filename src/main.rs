//! MSW survey report - descriptive statistics and charts for the
//! municipal solid-waste charging-scheme opinion survey.
//!
//! Loads the survey CSV once, runs the requested report sections in
//! order and writes the chart images to the output directory.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any failure (missing input, bad schema, rejected value, render error)

mod analysis;
mod cli;
mod config;
mod dataset;
mod error;
mod models;
mod render;
mod report;
mod scanner;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat, Section};
use config::{Config, DEFAULT_CONFIG_FILE};
use dataset::Dataset;
use models::{
    SurveySummary, ATTITUDE_FIELDS, DISTANCE, DISTRICT_PREFIX, FOOD_WASTE_BEHAVIOR,
    RECYCLING_EFFORT, SUPPORT_AFTER_INFO, SUPPORT_LEVEL, SUPPORT_SCALE,
};
use render::style::{JITTER_AMPLITUDE, JITTER_SEED};
use render::ChartRenderer;
use scanner::OutputScanner;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    let config = match load_config(&args) {
        Ok(mut config) => {
            config.merge_with_args(&args);
            config
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&args, &config);

    info!("msw-survey-report v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    match run_report(&args, &config) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Report failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .msw-survey.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to change the input file, output directory and validation.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let mut level = args.log_level();
    if level == tracing::Level::INFO && config.general.verbose {
        level = tracing::Level::DEBUG;
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    Ok(Config::load_default(Path::new("."))?.unwrap_or_default())
}

/// Run the requested sections over one loaded dataset. Returns the exit code.
fn run_report(args: &Args, config: &Config) -> Result<i32> {
    let sections = args.effective_sections();
    let text = config.report.format == OutputFormat::Text;
    let input = &config.general.input;
    let output_dir = &config.general.output_dir;

    let dataset = dataset::load_dataset(input, &config.validation)
        .with_context(|| format!("Failed to load survey data from {}", input.display()))?;
    debug!("Running {} sections over {} rows", sections.len(), dataset.row_count());

    let chart_count: usize = if config.report.charts {
        sections.iter().map(|s| s.charts().len()).sum()
    } else {
        0
    };
    let renderer = if chart_count > 0 {
        render::ensure_output_dir(output_dir)?;
        Some(ChartRenderer::new(output_dir.clone(), chart_count, !args.quiet))
    } else {
        debug!("Chart rendering disabled");
        None
    };

    let mut run = ReportRun::new(&dataset, output_dir.clone(), renderer);

    for section in &sections {
        let block = run.section_text(*section)?;
        if text {
            print!("{}", block);
        }
    }

    let summary = run.finish();

    if text {
        print!("{}", report::section_banner("ALL SECTIONS COMPLETED SUCCESSFULLY!"));
    } else {
        println!("{}", report::generate_json_summary(&summary)?);
    }

    Ok(0)
}

/// State shared by the sections of one run.
struct ReportRun<'a> {
    dataset: &'a Dataset,
    output_dir: PathBuf,
    renderer: Option<ChartRenderer>,
    summary: SurveySummary,
}

impl<'a> ReportRun<'a> {
    fn new(dataset: &'a Dataset, output_dir: PathBuf, renderer: Option<ChartRenderer>) -> Self {
        let (rows, columns) = dataset.shape();
        Self {
            dataset,
            output_dir,
            renderer,
            summary: SurveySummary {
                source: dataset.source().to_string(),
                rows,
                columns,
                ..Default::default()
            },
        }
    }

    /// Banner and body of one section, as printed in text mode.
    fn section_text(&mut self, section: Section) -> Result<String> {
        debug!("Running section {:?}", section);
        let block = self
            .run_section(section)
            .with_context(|| format!("{} failed", section.title()))?;
        Ok(format!("{}{}", report::section_banner(section.title()), block))
    }

    fn run_section(&mut self, section: Section) -> Result<String> {
        match section {
            Section::Load => Ok(self.load()),
            Section::Structure => Ok(self.structure()),
            Section::Categorical => self.categorical(),
            Section::District => self.district(),
            Section::Continuous => self.continuous(),
            Section::Relationship => self.relationship(),
            Section::Outputs => self.outputs(),
        }
    }

    fn finish(self) -> SurveySummary {
        let mut summary = self.summary;
        if let Some(renderer) = self.renderer {
            summary.charts = renderer.finish();
        }
        summary
    }

    fn load(&mut self) -> String {
        format!(
            "{}\n{}",
            report::format_shape(self.dataset),
            report::format_head(self.dataset, 5)
        )
    }

    fn structure(&mut self) -> String {
        let ds = self.dataset;
        let info = analysis::column_info(ds);
        let numeric = analysis::describe_numeric(ds);
        let categorical = analysis::describe_categorical(ds);

        let mut out = String::from("\nDataset Info:\n");
        out.push_str(&report::format_info(&info, ds.row_count()));
        out.push_str("\nSummary Statistics:\n");
        out.push_str(&report::format_numeric_describe(&numeric));
        out.push('\n');
        out.push_str(&report::format_categorical_describe(&categorical));
        out.push('\n');
        out.push_str(&report::format_column_list(&info));

        self.summary.column_info = info;
        self.summary.numeric_stats = numeric;
        self.summary.categorical_stats = categorical;
        out
    }

    fn categorical(&mut self) -> Result<String> {
        let ds = self.dataset;
        let domain = SUPPORT_SCALE.domain();
        let before = analysis::frequency_table(ds, SUPPORT_LEVEL, &domain)?;
        let after = analysis::frequency_table(ds, SUPPORT_AFTER_INFO, &domain)?;
        let attitudes = ATTITUDE_FIELDS
            .iter()
            .map(|(field, title)| Ok((analysis::frequency_table(ds, field, &domain)?, *title)))
            .collect::<Result<Vec<_>>>()?;

        let out = format!("\n{}", report::format_frequency_table(&before, &SUPPORT_SCALE));

        if let Some(renderer) = self.renderer.as_mut() {
            renderer.support_bar(&before)?;
            renderer.support_pie(&before)?;
            renderer.support_comparison(&before, &after, analysis::shared_axis_max(&[&before, &after]))?;

            let tables: Vec<_> = attitudes.iter().map(|(t, _)| t).collect();
            renderer.likert_grid(&attitudes, analysis::shared_axis_max(&tables))?;
        }

        self.summary.frequency_tables.push(before);
        self.summary.frequency_tables.push(after);
        self.summary
            .frequency_tables
            .extend(attitudes.into_iter().map(|(t, _)| t));
        Ok(out)
    }

    fn district(&mut self) -> Result<String> {
        let ds = self.dataset;
        let fields = ds.columns_with_prefix(DISTRICT_PREFIX);
        let sums = analysis::group_sums(ds, &fields, DISTRICT_PREFIX)?;
        let tab = analysis::cross_tab_percentage(
            ds,
            &fields,
            DISTRICT_PREFIX,
            FOOD_WASTE_BEHAVIOR,
            analysis::is_indicator_member,
        )?;

        if !tab.empty_groups.is_empty() {
            info!(
                "Omitting districts with no respondents: {}",
                tab.empty_groups.join(", ")
            );
        }

        let mut out = format!("\n{}", report::format_district_distribution(&sums));
        out.push('\n');
        out.push_str(&report::format_cross_tab(&tab));

        if let Some(renderer) = self.renderer.as_mut() {
            renderer.district_distribution(&sums)?;
            renderer.food_waste_by_district(&tab)?;
        }

        self.summary.districts = sums;
        self.summary.food_waste_by_district = Some(tab);
        Ok(out)
    }

    fn continuous(&mut self) -> Result<String> {
        let ds = self.dataset;
        let stats = analysis::describe_column(ds, DISTANCE)?;
        let out = format!("\n{}", report::format_distance_summary(&stats));

        if let Some(renderer) = self.renderer.as_mut() {
            let values = ds.column(DISTANCE)?.present_values();
            renderer.distance_analysis(&values)?;
        }

        self.summary.distance = Some(stats);
        Ok(out)
    }

    fn relationship(&mut self) -> Result<String> {
        let ds = self.dataset;
        let rel = analysis::relationship(ds, DISTANCE, RECYCLING_EFFORT)?;
        if rel.correlation.is_none() {
            warn!(
                "Correlation between {} and {} is undefined ({} complete pairs)",
                DISTANCE, RECYCLING_EFFORT, rel.pairs
            );
        }

        if let Some(renderer) = self.renderer.as_mut() {
            let offsets = render::jitter_offsets(ds.row_count(), JITTER_SEED, JITTER_AMPLITUDE);
            let points = render::jittered_points(
                &ds.numeric(DISTANCE)?,
                &ds.numeric(RECYCLING_EFFORT)?,
                &offsets,
            );
            renderer.distance_scatter(&points, rel.fit)?;
            renderer.distance_regplot(&points, rel.fit)?;
        }

        let out = format!("\n{}", report::format_correlation(&rel));
        self.summary.distance_vs_recycling = Some(rel);
        Ok(out)
    }

    fn outputs(&mut self) -> Result<String> {
        let dir = self.output_dir.display();
        let mut out = if render::ensure_output_dir(&self.output_dir)? {
            format!("Created directory: '{}'\n\n", dir)
        } else {
            format!("Directory '{}' already exists\n\n", dir)
        };

        let files = OutputScanner::new(self.output_dir.clone()).scan()?;
        out.push_str(&report::format_output_listing(&self.output_dir, files.as_deref()));
        self.summary.output_files = files;
        Ok(out)
    }
}
