//! CLI argument definitions and parsing structures.

use crate::config::{
    default_database_path, AppConfig, DataSource, DEFAULT_FIXTURES_DIR, DEFAULT_PORT,
    DEFAULT_REPORTS_DIR, DEFAULT_SUMMARY_CSV,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Data-source arguments shared between commands
#[derive(Debug, Clone, Args)]
pub struct DataArgs {
    /// SQLite database (or set `OLYMPICS_DATABASE`).
    #[clap(long, env = "OLYMPICS_DATABASE")]
    pub database: Option<PathBuf>,

    /// Directory holding the JSON fixture snapshots.
    #[clap(long, env = "OLYMPICS_FIXTURES_DIR", default_value = DEFAULT_FIXTURES_DIR)]
    pub fixtures_dir: PathBuf,
}

impl DataArgs {
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(default_database_path)
    }
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    #[clap(flatten)]
    pub data: DataArgs,

    /// Port to listen on.
    #[clap(long, short, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Serve fixtures only; never open the database.
    #[clap(long = "demo", env = "DEMO_MODE")]
    pub demo: bool,

    /// Reports directory (figures, score CSVs, prediction CSV).
    #[clap(long, env = "OLYMPICS_REPORTS_DIR", default_value = DEFAULT_REPORTS_DIR)]
    pub reports_dir: PathBuf,

    /// Historical country totals used to enrich CSV predictions.
    #[clap(long, env = "OLYMPICS_SUMMARY_CSV", default_value = DEFAULT_SUMMARY_CSV)]
    pub summary_csv: PathBuf,

    /// Include internal error detail in 500 responses.
    #[clap(long, env = "OLYMPICS_DEBUG_ERRORS")]
    pub debug_errors: bool,
}

impl From<ServeArgs> for AppConfig {
    fn from(args: ServeArgs) -> Self {
        let data_source = if args.demo {
            DataSource::Demo
        } else {
            DataSource::Store {
                database: args.data.database_path(),
            }
        };

        AppConfig {
            port: args.port,
            data_source,
            fixtures_dir: args.data.fixtures_dir,
            reports_dir: args.reports_dir,
            summary_csv: args.summary_csv,
            debug_errors: args.debug_errors,
        }
    }
}

#[derive(Debug, Parser)]
#[clap(name = "olympics-api", about = "Olympic Games statistics data API", version)]
pub struct OlympicsCli {
    /// Emit logs as JSON lines.
    #[clap(long, global = true)]
    pub log_json: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the HTTP API
    Serve(ServeArgs),

    /// Load the fixture snapshots into the SQLite store
    ///
    /// Creates the schema if needed; re-running replaces rows with the same ids.
    Import {
        #[clap(flatten)]
        data: DataArgs,
    },
}
