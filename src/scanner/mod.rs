//! Output directory scanner.
//!
//! Lists the files a run left in the output directory so the report can
//! show what was saved.

use crate::error::{SurveyError, SurveyResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// A regular file found in the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedFile {
    /// File name relative to the output directory
    pub name: String,
    /// File size in bytes
    pub size: u64,
}

impl ScannedFile {
    pub fn size_kb(&self) -> f64 {
        self.size as f64 / 1024.0
    }
}

/// Scanner over one output directory.
pub struct OutputScanner {
    dir: PathBuf,
}

impl OutputScanner {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Regular files sorted by name, or `None` when the directory is absent.
    pub fn scan(&self) -> SurveyResult<Option<Vec<ScannedFile>>> {
        if !self.dir.is_dir() {
            debug!("Output directory {} not found", self.dir.display());
            return Ok(None);
        }

        let to_error = |source: std::io::Error| SurveyError::OutputDir {
            path: self.dir.clone(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(to_error)? {
            let entry = entry.map_err(to_error)?;
            let metadata = entry.metadata().map_err(to_error)?;
            if !metadata.is_file() {
                continue;
            }

            files.push(ScannedFile {
                name: entry.file_name().to_string_lossy().to_string(),
                size: metadata.len(),
            });
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        debug!("Found {} files in {}", files.len(), self.dir.display());
        Ok(Some(files))
    }
}
