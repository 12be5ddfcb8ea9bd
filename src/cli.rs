//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and the report section list.

use crate::models::ValidationMode;
use crate::render::ChartKind;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// MSW survey report - statistics and charts for the charging-scheme survey
///
/// Loads the survey CSV once, prints the summary tables for each report
/// section and writes the PNG charts to the output directory.
///
/// Examples:
///   msw-survey-report
///   msw-survey-report --input data/GCAP3226_week2.csv --output-dir plots
///   msw-survey-report --sections categorical,district --no-charts
///   msw-survey-report --format json --scale-validation clamp
///   msw-survey-report --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Survey CSV file to analyze
    ///
    /// Defaults to GCAP3226_week2.csv in the current directory, or the
    /// `input` value of the config file.
    #[arg(short, long, value_name = "FILE", env = "MSW_SURVEY_INPUT")]
    pub input: Option<PathBuf>,

    /// Directory the charts are written to
    #[arg(short, long, value_name = "DIR", env = "MSW_SURVEY_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .msw-survey.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Report sections to run (comma-separated)
    ///
    /// Example: --sections load,categorical,relationship
    #[arg(short, long, value_name = "LIST", value_delimiter = ',')]
    pub sections: Option<Vec<Section>>,

    /// Print statistics only, without writing charts
    #[arg(long)]
    pub no_charts: bool,

    /// Output format (text, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Treatment of out-of-range Likert and effort values
    #[arg(long, value_name = "MODE")]
    pub scale_validation: Option<ValidationMode>,

    /// Treatment of district indicator values other than 0 and 1
    #[arg(long, value_name = "MODE")]
    pub indicator_validation: Option<ValidationMode>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only, no progress bar)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .msw-survey.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Console tables (default)
    #[default]
    Text,
    /// One JSON summary document
    Json,
}

/// A report section, run in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum Section {
    /// First rows and shape
    Load,
    /// Column info and descriptive statistics
    Structure,
    /// Support level frequencies and Likert charts
    Categorical,
    /// District distribution and food-waste cross table
    District,
    /// Distance summary, box plot and histogram
    Continuous,
    /// Distance against recycling effort
    Relationship,
    /// Files saved in the output directory
    Outputs,
}

impl Section {
    pub const ALL: [Section; 7] = [
        Section::Load,
        Section::Structure,
        Section::Categorical,
        Section::District,
        Section::Continuous,
        Section::Relationship,
        Section::Outputs,
    ];

    /// Banner title printed before the section.
    pub fn title(&self) -> &'static str {
        match self {
            Section::Load => "SECTION 1: Load and Examine the Dataset",
            Section::Structure => "SECTION 2: Dataset Structure and Summary Statistics",
            Section::Categorical => "SECTION 3: Categorical Data Visualization",
            Section::District => "SECTION 3 (Extended): District Distribution and Cross-Table Analysis",
            Section::Continuous => "SECTION 4: Continuous Data Analysis",
            Section::Relationship => "SECTION 5: Relationship Analysis",
            Section::Outputs => "SECTION 6: Saved Visualizations",
        }
    }

    /// Charts written by the section.
    pub fn charts(&self) -> &'static [ChartKind] {
        match self {
            Section::Categorical => &[
                ChartKind::SupportBar,
                ChartKind::SupportPie,
                ChartKind::SupportComparison,
                ChartKind::LikertGrid,
            ],
            Section::District => &[
                ChartKind::DistrictDistribution,
                ChartKind::FoodWasteByDistrict,
            ],
            Section::Continuous => &[ChartKind::DistanceAnalysis],
            Section::Relationship => &[ChartKind::DistanceScatter, ChartKind::DistanceRegplot],
            Section::Load | Section::Structure | Section::Outputs => &[],
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref sections) = self.sections {
            if sections.is_empty() {
                return Err("At least one section must be given to --sections".to_string());
            }
        }

        if let Some(ref input) = self.input {
            if input.is_dir() {
                return Err(format!("Input path is a directory: {}", input.display()));
            }
        }

        if let Some(ref dir) = self.output_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(format!(
                    "Output path is not a directory: {}",
                    dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Requested sections, deduplicated and in run order.
    pub fn effective_sections(&self) -> Vec<Section> {
        match self.sections {
            Some(ref sections) => {
                let mut sections = sections.clone();
                sections.sort();
                sections.dedup();
                sections
            }
            None => Section::ALL.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            input: Some(PathBuf::from("survey.csv")),
            output_dir: None,
            config: None,
            sections: None,
            no_charts: false,
            format: None,
            scale_validation: None,
            indicator_validation: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_input_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut args = make_args();
        args.input = Some(temp.path().to_path_buf());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_init_config_skips_validation() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_effective_sections_order() {
        let mut args = make_args();
        assert_eq!(args.effective_sections(), Section::ALL.to_vec());

        args.sections = Some(vec![
            Section::Relationship,
            Section::Load,
            Section::Relationship,
        ]);
        assert_eq!(
            args.effective_sections(),
            vec![Section::Load, Section::Relationship]
        );
    }

    #[test]
    fn test_parse_sections_and_modes() {
        let args = Args::try_parse_from([
            "msw-survey-report",
            "--sections",
            "district,continuous",
            "--scale-validation",
            "clamp",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(
            args.sections,
            Some(vec![Section::District, Section::Continuous])
        );
        assert_eq!(args.scale_validation, Some(ValidationMode::Clamp));
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert!(args.indicator_validation.is_none());
    }

    #[test]
    fn test_section_charts_cover_every_kind() {
        let total: usize = Section::ALL.iter().map(|s| s.charts().len()).sum();
        assert_eq!(total, ChartKind::ALL.len());
    }
}
