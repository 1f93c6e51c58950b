//! Database schema and connection management

use super::cache::{MemoryCache, COUNT_CACHE_CAPACITY};
use crate::error::{OlympicsError, Result};
use crate::query::FilterSet;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// SQLite-backed Olympics store
///
/// The connection is shared behind a mutex; callers on an async runtime
/// should reach it from the blocking pool.
pub struct OlympicsDatabase {
    conn: Mutex<Connection>,
    pub(crate) counts: MemoryCache<FilterSet, u64>,
}

impl OlympicsDatabase {
    /// Open (creating if needed) the database at `path` and ensure tables exist.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an existing database without creating it or its schema.
    pub fn open_existing(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            counts: MemoryCache::new(COUNT_CACHE_CAPACITY),
        })
    }

    /// Fresh in-memory store with the schema applied.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Mutex::new(conn),
            counts: MemoryCache::new(COUNT_CACHE_CAPACITY),
        };
        db.initialize_schema()?;
        Ok(db)
    }

    pub(crate) fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| OlympicsError::Internal {
            message: "database connection lock poisoned".to_string(),
        })
    }

    /// Verify the store answers queries against its core relations.
    pub fn probe(&self) -> Result<()> {
        let conn = self.connection()?;
        for table in ["athletes", "medals", "hosts"] {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get::<_, i64>(0)
            })
            .map_err(|err| match OlympicsError::from(err) {
                OlympicsError::TableMissing { table } => {
                    OlympicsError::StoreUnavailable(format!("missing core table {}", table))
                }
                other => other,
            })?;
        }
        debug!("Store probe succeeded");
        Ok(())
    }

    /// Initialize the core schema.
    ///
    /// `medal_predictions` is deliberately absent: the ML pipeline creates it,
    /// see [`OlympicsDatabase::create_prediction_table`].
    pub(crate) fn initialize_schema(&self) -> Result<()> {
        let conn = self.connection()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS athletes (
                id INTEGER PRIMARY KEY,
                name TEXT,
                sex TEXT,
                age INTEGER,
                nationality TEXT
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS hosts (
                year INTEGER NOT NULL,
                season TEXT,
                city TEXT,
                country TEXT,
                UNIQUE (year, season)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS medals (
                id INTEGER PRIMARY KEY,
                athlete_id INTEGER NOT NULL,
                year INTEGER NOT NULL,
                season TEXT,
                city TEXT,
                sport TEXT,
                event TEXT,
                medal TEXT,
                FOREIGN KEY (athlete_id) REFERENCES athletes(id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS country_year_summary (
                country_name TEXT NOT NULL,
                slug_game TEXT NOT NULL,
                medals_total REAL,
                PRIMARY KEY (country_name, slug_game)
            )",
            [],
        )?;

        // Indexes for the filter columns
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_medals_year_season ON medals(year, season)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_medals_sport ON medals(sport)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_athletes_nationality ON athletes(nationality)",
            [],
        )?;

        Ok(())
    }

    /// Create the predictions table the ML pipeline writes to.
    pub fn create_prediction_table(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS medal_predictions (
                country_name TEXT NOT NULL,
                slug_game TEXT NOT NULL,
                model_name TEXT NOT NULL,
                target TEXT NOT NULL,
                predicted_value REAL NOT NULL,
                created_at TEXT
            )",
            [],
        )?;
        Ok(())
    }
}
