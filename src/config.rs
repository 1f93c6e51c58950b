//! Runtime configuration resolved from command-line flags and environment.

use crate::error::{OlympicsError, Result};
use std::path::{Path, PathBuf};

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_FIXTURES_DIR: &str = "data/demo";
pub const DEFAULT_REPORTS_DIR: &str = "reports";
pub const DEFAULT_SUMMARY_CSV: &str = "data/processed/country_year_summary.csv";
/// Prediction CSV inside the reports directory.
pub const PREDICTIONS_CSV: &str = "medal_predictions.csv";

/// Where medal data is served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// SQLite store at the given path.
    Store { database: PathBuf },
    /// JSON fixtures only; the store is never opened.
    Demo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub data_source: DataSource,
    pub fixtures_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub summary_csv: PathBuf,
    pub debug_errors: bool,
}

impl AppConfig {
    pub fn is_demo(&self) -> bool {
        self.data_source == DataSource::Demo
    }

    /// Database path; asking for it in demo mode is a wiring defect.
    pub fn database_path(&self) -> Result<&Path> {
        match &self.data_source {
            DataSource::Store { database } => Ok(database),
            DataSource::Demo => Err(OlympicsError::demo_mode_restricted("open database")),
        }
    }

    pub fn predictions_csv(&self) -> PathBuf {
        self.reports_dir.join(PREDICTIONS_CSV)
    }
}

/// `<data dir>/olympics-api/olympics.db`, falling back to `~/.local/share`.
pub fn default_database_path() -> PathBuf {
    let base = dirs::data_dir().unwrap_or_else(|| {
        let mut home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.push(".local");
        home.push("share");
        home
    });
    base.join("olympics-api").join("olympics.db")
}
