//! Repository Pattern for the competition store
//!
//! The store keeps every competition that has already been announced so the
//! next cycle can tell new entries apart from known ones.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Business Logic                          │
//! │                 (pipeline::cycle, CLI)                      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   CompetitionRepository                     │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                     │
//!                    ▼                     ▼
//!          ┌─────────────────┐   ┌─────────────────┐
//!          │     SQLite      │   │      Mock       │
//!          │  Implementation │   │ Implementation  │
//!          └─────────────────┘   └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use cubewatch::storage::repository::{CompetitionRepository, SqliteCompetitionRepository};
//!
//! let repo = SqliteCompetitionRepository::new("data/competitions.db")?;
//! let known = repo.load_known(chrono::Local::now().date_naive())?;
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::NaiveDate;
use rusqlite::{ffi, params, Connection, OptionalExtension, Row};

use crate::models::Competition;
use crate::utils::error::StoreError;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// Core Types
// ============================================================================

/// Outcome of a single insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A record with the same url was already stored; nothing changed
    AlreadyPresent,
}

/// Summary of a batch insert
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub inserted: usize,
    pub already_present: usize,
    /// Urls whose insert failed
    pub failed: Vec<String>,
}

impl BatchReport {
    /// Total records attempted
    pub fn total(&self) -> usize {
        self.inserted + self.already_present + self.failed.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

// ============================================================================
// Repository Trait
// ============================================================================

/// Persistence for announced competitions
///
/// `url` is the unique key. Every method is atomic on its own; there is no
/// cross-call transaction.
pub trait CompetitionRepository: Send + Sync {
    /// Competitions whose `end_date >= as_of`
    fn load_known(&self, as_of: NaiveDate) -> StoreResult<Vec<Competition>>;

    /// Store a competition; a duplicate url is a no-op
    fn insert(&self, competition: &Competition) -> StoreResult<InsertOutcome>;

    /// Delete by url, returning whether a row was removed
    fn delete(&self, url: &str) -> StoreResult<bool>;

    /// Delete every competition with `end_date < as_of`
    fn purge_expired(&self, as_of: NaiveDate) -> StoreResult<usize>;

    /// Look up a single competition by url
    fn get(&self, url: &str) -> StoreResult<Option<Competition>>;

    /// Number of stored competitions
    fn count(&self) -> StoreResult<usize>;

    /// Insert records one by one; a failure never stops the batch
    fn insert_all(&self, competitions: &[Competition]) -> BatchReport {
        let mut report = BatchReport::default();

        for competition in competitions {
            match self.insert(competition) {
                Ok(InsertOutcome::Inserted) => report.inserted += 1,
                Ok(InsertOutcome::AlreadyPresent) => report.already_present += 1,
                Err(e) => {
                    tracing::error!(url = %competition.url, error = %e, "Failed to store competition");
                    report.failed.push(competition.url.clone());
                }
            }
        }

        report
    }
}

// ============================================================================
// SQLite Implementation
// ============================================================================

/// SQLite implementation of CompetitionRepository
///
/// Uses `Mutex` to ensure thread-safety for the SQLite connection.
pub struct SqliteCompetitionRepository {
    conn: Mutex<Connection>,
}

impl SqliteCompetitionRepository {
    /// Create a new SQLite repository
    pub fn new(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrency
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.create_schema()?;

        tracing::info!(path = %path.display(), "SQLite repository initialized");
        Ok(repo)
    }

    /// Create in-memory repository (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.create_schema()?;
        Ok(repo)
    }

    /// Create database schema
    fn create_schema(&self) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
                CREATE TABLE IF NOT EXISTS competitions (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    start_date TEXT NOT NULL,
                    end_date TEXT NOT NULL,
                    country TEXT NOT NULL,
                    location TEXT NOT NULL,
                    url TEXT NOT NULL UNIQUE
                );

                CREATE INDEX IF NOT EXISTS idx_competitions_end_date
                    ON competitions(end_date);
                "#,
        )?;

        Ok(())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Plain insert; a url collision surfaces as `DuplicateKey`
    fn insert_row(conn: &Connection, c: &Competition) -> StoreResult<()> {
        let result = conn.execute(
            r#"
                INSERT INTO competitions (name, start_date, end_date, country, location, url)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            params![
                c.name,
                c.start_date.format(DATE_FORMAT).to_string(),
                c.end_date.format(DATE_FORMAT).to_string(),
                c.country,
                c.location,
                c.url
            ],
        );

        result.map(|_| ()).map_err(|e| insert_error(e, &c.url))
    }
}

/// Only a UNIQUE violation means the url is already stored; other
/// constraint failures stay database errors
fn insert_error(err: rusqlite::Error, url: &str) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE => {
            StoreError::DuplicateKey(url.to_string())
        }
        e => e.into(),
    }
}

/// Row as read from SQLite, dates still textual
struct StoredRow {
    name: String,
    start_date: String,
    end_date: String,
    country: String,
    location: String,
    url: String,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get(0)?,
            start_date: row.get(1)?,
            end_date: row.get(2)?,
            country: row.get(3)?,
            location: row.get(4)?,
            url: row.get(5)?,
        })
    }

    fn into_competition(self) -> StoreResult<Competition> {
        Ok(Competition {
            start_date: decode_date("start_date", &self.start_date)?,
            end_date: decode_date("end_date", &self.end_date)?,
            name: self.name,
            url: self.url,
            country: self.country,
            location: self.location,
        })
    }
}

fn decode_date(column: &'static str, value: &str) -> StoreResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| StoreError::Corrupt {
        column,
        value: value.to_string(),
    })
}

impl CompetitionRepository for SqliteCompetitionRepository {
    fn load_known(&self, as_of: NaiveDate) -> StoreResult<Vec<Competition>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT name, start_date, end_date, country, location, url
             FROM competitions WHERE end_date >= ?1 ORDER BY start_date, id",
        )?;

        let rows = stmt
            .query_map(params![as_of.format(DATE_FORMAT).to_string()], StoredRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(StoredRow::into_competition).collect()
    }

    fn insert(&self, competition: &Competition) -> StoreResult<InsertOutcome> {
        let conn = self.lock()?;
        match Self::insert_row(&conn, competition) {
            Ok(()) => Ok(InsertOutcome::Inserted),
            Err(e) if e.is_duplicate() => {
                tracing::debug!(url = %competition.url, "Competition already stored");
                Ok(InsertOutcome::AlreadyPresent)
            }
            Err(e) => Err(e),
        }
    }

    fn delete(&self, url: &str) -> StoreResult<bool> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM competitions WHERE url = ?1", params![url])?;
        Ok(removed > 0)
    }

    fn purge_expired(&self, as_of: NaiveDate) -> StoreResult<usize> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM competitions WHERE end_date < ?1",
            params![as_of.format(DATE_FORMAT).to_string()],
        )?;
        Ok(removed)
    }

    fn get(&self, url: &str) -> StoreResult<Option<Competition>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT name, start_date, end_date, country, location, url
                 FROM competitions WHERE url = ?1",
                params![url],
                StoredRow::from_row,
            )
            .optional()?;

        row.map(StoredRow::into_competition).transpose()
    }

    fn count(&self) -> StoreResult<usize> {
        let conn = self.lock()?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM competitions", [], |row| row.get(0))?;
        Ok(total as usize)
    }
}

// ============================================================================
// Mock Implementation (for testing)
// ============================================================================

/// In-memory mock implementation of CompetitionRepository
///
/// Useful for testing without database dependencies. Urls registered with
/// [`MockCompetitionRepository::fail_on`] make `insert` return an error.
pub struct MockCompetitionRepository {
    records: RwLock<HashMap<String, Competition>>,
    failing: RwLock<HashSet<String>>,
}

impl MockCompetitionRepository {
    /// Create a new mock repository
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            failing: RwLock::new(HashSet::new()),
        }
    }

    /// Make inserts of `url` fail
    pub fn fail_on(&self, url: impl Into<String>) {
        if let Ok(mut failing) = self.failing.write() {
            failing.insert(url.into());
        }
    }

    /// Get the number of records
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all records
    pub fn clear(&self) {
        if let Ok(mut records) = self.records.write() {
            records.clear();
        }
    }
}

impl Default for MockCompetitionRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl CompetitionRepository for MockCompetitionRepository {
    fn load_known(&self, as_of: NaiveDate) -> StoreResult<Vec<Competition>> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut known: Vec<Competition> = records
            .values()
            .filter(|c| c.is_active_on(as_of))
            .cloned()
            .collect();
        known.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.url.cmp(&b.url)));
        Ok(known)
    }

    fn insert(&self, competition: &Competition) -> StoreResult<InsertOutcome> {
        let failing = self.failing.read().map_err(|_| StoreError::LockPoisoned)?;
        if failing.contains(&competition.url) {
            return Err(StoreError::Database(rusqlite::Error::InvalidQuery));
        }

        let mut records = self.records.write().map_err(|_| StoreError::LockPoisoned)?;
        if records.contains_key(&competition.url) {
            return Ok(InsertOutcome::AlreadyPresent);
        }
        records.insert(competition.url.clone(), competition.clone());
        Ok(InsertOutcome::Inserted)
    }

    fn delete(&self, url: &str) -> StoreResult<bool> {
        let mut records = self.records.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(records.remove(url).is_some())
    }

    fn purge_expired(&self, as_of: NaiveDate) -> StoreResult<usize> {
        let mut records = self.records.write().map_err(|_| StoreError::LockPoisoned)?;
        let before = records.len();
        records.retain(|_, c| c.is_active_on(as_of));
        Ok(before - records.len())
    }

    fn get(&self, url: &str) -> StoreResult<Option<Competition>> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(records.get(url).cloned())
    }

    fn count(&self) -> StoreResult<usize> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(records.len())
    }
}

// ============================================================================
// Shared Repository Types
// ============================================================================

/// Thread-safe shared repository wrapper
pub type SharedCompetitionRepository = Arc<dyn CompetitionRepository>;

/// Create a shared SQLite repository
pub fn create_sqlite_repository(path: impl AsRef<Path>) -> StoreResult<SharedCompetitionRepository> {
    let repo = SqliteCompetitionRepository::new(path)?;
    Ok(Arc::new(repo))
}

/// Create a shared mock repository
pub fn create_mock_repository() -> SharedCompetitionRepository {
    Arc::new(MockCompetitionRepository::new())
}

// ============================================================================
// Tests
// ============================================================================
