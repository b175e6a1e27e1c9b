//! SQLite-based session storage.
//!
//! Provides persistent storage for:
//! - Finished Pomodoro sessions (completed or partial), append-only
//! - Key-value store for shell state
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings
//! (`2026-10-19T09:00:00Z`), so ordering and date filtering can be done on
//! the text column directly. That only holds for four-digit years, so
//! timestamps outside 0000-9999 are rejected on insert. UTC is the only
//! reference time zone; no conversion happens on the way in or out.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::{data_dir, ensure_dir, migrations};
use crate::error::{DatabaseError, Result, ValidationError};

/// Row cap used by history listings when nothing else is configured.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

const DB_FILE: &str = "pmo.db";

/// Years whose RFC 3339 form is fixed-width.
const STORABLE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

const SELECT_COLUMNS: &str =
    "SELECT id, task_name, start_time, end_time, duration, completed_cycles, is_completed
     FROM sessions";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub task_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Whole minutes between start and end, rounded down.
    pub duration_min: u64,
    pub completed_cycles: u32,
    pub is_completed: bool,
}

/// SQLite store for finished sessions.
///
/// Opened once at startup and kept for the process lifetime. Records are
/// never updated or deleted.
pub struct SessionStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Open the store at `<data dir>/pmo.db`.
    ///
    /// Creates the directory, the database file and the schema if they
    /// don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created, or the
    /// database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join(DB_FILE);
        Self::open_at(path)
    }

    /// Open the store at an explicit path, creating its parent directory.
    ///
    /// # Errors
    /// Same as [`SessionStore::open`].
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }

        let conn = Connection::open(&path).map_err(|source| DatabaseError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let store = Self {
            conn,
            path: Some(path),
        };
        store.migrate()?;
        tracing::info!(path = ?store.path, "session store opened");
        Ok(store)
    }

    /// Open an in-memory store (tests and throwaway shells).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| DatabaseError::OpenFailed {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        let store = Self { conn, path: None };
        store.migrate()?;
        Ok(store)
    }

    /// Location of the backing file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        migrations::migrate(&self.conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    // ── Sessions ─────────────────────────────────────────────────────

    /// Record a fully finished session.
    ///
    /// Sessions without a task are never recorded: an empty `task` returns
    /// `Ok(None)` without touching the database.
    ///
    /// # Errors
    /// Returns an error if `end < start` or the insert fails.
    pub fn save_completed(
        &self,
        task: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        completed_cycles: u32,
    ) -> Result<Option<i64>> {
        if task.is_empty() {
            tracing::debug!("completed session without task not recorded");
            return Ok(None);
        }
        self.insert(task, start, end, completed_cycles, true).map(Some)
    }

    /// Record a partially finished session.
    ///
    /// Dropped (`Ok(None)`) when `task` is empty or no cycle was completed.
    ///
    /// # Errors
    /// Returns an error if `end < start` or the insert fails.
    pub fn save_partial(
        &self,
        task: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        completed_cycles: u32,
    ) -> Result<Option<i64>> {
        if task.is_empty() || completed_cycles < 1 {
            tracing::debug!(completed_cycles, "partial session not recorded");
            return Ok(None);
        }
        self.insert(task, start, end, completed_cycles, false).map(Some)
    }

    fn insert(
        &self,
        task: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        completed_cycles: u32,
        is_completed: bool,
    ) -> Result<i64> {
        if end < start {
            return Err(ValidationError::InvalidTimeRange { start, end }.into());
        }
        for ts in [start, end] {
            if !STORABLE_YEARS.contains(&ts.year()) {
                return Err(ValidationError::TimestampOutOfRange(ts).into());
            }
        }
        let duration_min = (end - start).num_minutes();

        self.conn
            .execute(
                "INSERT INTO sessions (task_name, start_time, end_time, duration, completed_cycles, is_completed)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    task,
                    format_ts(start),
                    format_ts(end),
                    duration_min,
                    completed_cycles,
                    is_completed,
                ],
            )
            .map_err(DatabaseError::from)?;

        let id = self.conn.last_insert_rowid();
        tracing::info!(id, task, duration_min, completed_cycles, is_completed, "session recorded");
        Ok(id)
    }

    /// All sessions whose start falls on `date` (UTC), most recent first.
    ///
    /// # Errors
    /// Returns the underlying storage error unchanged.
    pub fn query_by_date(&self, date: NaiveDate) -> Result<Vec<SessionRecord>> {
        if !STORABLE_YEARS.contains(&date.year()) {
            return Ok(Vec::new());
        }
        // Every stored start on `date` sorts between "<date>T" and "<date>U".
        let day = date.format("%Y-%m-%d");
        let (day_start, day_end) = (format!("{day}T"), format!("{day}U"));

        let sql = format!(
            "{SELECT_COLUMNS}
             WHERE start_time >= ?1 AND start_time < ?2
             ORDER BY start_time DESC, id DESC"
        );
        self.collect(&sql, params![day_start, day_end])
    }

    /// The `limit` most recent sessions by start time.
    ///
    /// # Errors
    /// Returns the underlying storage error unchanged.
    pub fn query_recent(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let sql = format!(
            "{SELECT_COLUMNS}
             ORDER BY start_time DESC, id DESC
             LIMIT ?1"
        );
        self.collect(&sql, params![limit])
    }

    /// Number of recorded sessions.
    pub fn session_count(&self) -> Result<u64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get::<_, u64>(0))
            .map_err(DatabaseError::from)?;
        Ok(count)
    }

    fn collect(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(sql).map_err(DatabaseError::from)?;
        let rows = stmt
            .query_map(params, row_to_record)
            .map_err(DatabaseError::from)?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row.map_err(DatabaseError::from)?);
        }
        Ok(sessions)
    }

    // ── Key-value ────────────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .map_err(DatabaseError::from)?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(DatabaseError::from)?;
        Ok(())
    }

    /// Remove a key from the kv store. Missing keys are ignored.
    pub fn kv_delete(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(DatabaseError::from)?;
        Ok(())
    }
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<SessionRecord> {
    Ok(SessionRecord {
        id: row.get(0)?,
        task_name: row.get(1)?,
        start_time: parse_ts(row, 2)?,
        end_time: parse_ts(row, 3)?,
        duration_min: row.get(4)?,
        completed_cycles: row.get(5)?,
        is_completed: row.get(6)?,
    })
}
