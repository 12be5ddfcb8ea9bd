//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.msw-survey.toml` files.

use crate::cli::OutputFormat;
use crate::dataset::ValidationPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".msw-survey.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Value validation applied at load time.
    #[serde(default)]
    pub validation: ValidationPolicy,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Survey CSV file.
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Directory the charts are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output_dir: default_output_dir(),
            verbose: false,
        }
    }
}

fn default_input() -> PathBuf {
    PathBuf::from("GCAP3226_week2.csv")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("plots")
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Write chart images.
    #[serde(default = "default_true")]
    pub charts: bool,

    /// Console output format.
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            charts: true,
            format: OutputFormat::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load `.msw-survey.toml` from `dir`.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default(dir: &Path) -> Result<Option<Self>> {
        let default_path = dir.join(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(&default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref input) = args.input {
            self.general.input = input.clone();
        }
        if let Some(ref dir) = args.output_dir {
            self.general.output_dir = dir.clone();
        }

        if let Some(mode) = args.scale_validation {
            self.validation.scales = mode;
        }
        if let Some(mode) = args.indicator_validation {
            self.validation.indicators = mode;
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }

        // Flags always override
        if args.no_charts {
            self.report.charts = false;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
