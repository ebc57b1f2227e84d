//! SQLite-based session storage and statistics.
//!
//! Provides persistent storage for:
//! - Session events (started / completed)
//! - Daily, weekly and all-time statistics derived from them
//! - Key-value store for the timer's persisted records

use chrono::{DateTime, Local, NaiveDate, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use super::{data_dir, migrations};
use crate::collaborators::{KeyValueStore, StatisticsRecorder};
use crate::error::{Result, StorageError};
use crate::stats::{self, AllTimeStats, DailyStats, SessionEvent, SessionRow, WeeklyStats};
use crate::timer::SessionKind;

/// SQLite database for session events and persisted timer records.
///
/// The connection sits behind a mutex so the database can be shared with
/// the effect worker as a collaborator.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `~/.config/focustimer/focustimer.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("focustimer.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "database opened");
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn).map_err(|e| StorageError::MigrationFailed(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Locked.into())
    }

    /// Record a session event at an explicit moment.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_at(
        &self,
        kind: SessionKind,
        event: SessionEvent,
        duration_min: u32,
        at: DateTime<Utc>,
    ) -> Result<i64> {
        let local_date = at.with_timezone(&Local).date_naive();
        self.record_on(kind, event, duration_min, at, local_date)
    }

    fn record_on(
        &self,
        kind: SessionKind,
        event: SessionEvent,
        duration_min: u32,
        at: DateTime<Utc>,
        local_date: NaiveDate,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO sessions (kind, event, duration_min, occurred_at, local_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                kind.as_str(),
                event.as_str(),
                duration_min,
                at.to_rfc3339(),
                local_date.format("%Y-%m-%d").to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn rows(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<SessionRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let raw = stmt.query_map(args, |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut out = Vec::new();
        for r in raw {
            let (kind, event, duration_min, date) = r?;
            let parsed = (
                SessionKind::parse(&kind),
                SessionEvent::parse(&event),
                NaiveDate::parse_from_str(&date, "%Y-%m-%d").ok(),
            );
            match parsed {
                (Some(kind), Some(event), Some(local_date)) => out.push(SessionRow {
                    kind,
                    event,
                    duration_min,
                    local_date,
                }),
                _ => warn!(%kind, %event, %date, "skipping unreadable session row"),
            }
        }
        Ok(out)
    }

    fn rows_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<SessionRow>> {
        let from = from.format("%Y-%m-%d").to_string();
        let to = to.format("%Y-%m-%d").to_string();
        self.rows(
            "SELECT kind, event, duration_min, local_date FROM sessions
             WHERE local_date >= ?1 AND local_date <= ?2",
            &[&from, &to],
        )
    }

    fn all_rows(&self) -> Result<Vec<SessionRow>> {
        self.rows(
            "SELECT kind, event, duration_min, local_date FROM sessions",
            &[],
        )
    }

    pub fn daily_stats(&self, date: NaiveDate) -> Result<DailyStats> {
        Ok(stats::daily(&self.rows_between(date, date)?, date))
    }

    /// Stats for the ISO week containing `date`.
    pub fn weekly_stats(&self, date: NaiveDate) -> Result<WeeklyStats> {
        let week = date.week(chrono::Weekday::Mon);
        let rows = self.rows_between(week.first_day(), week.last_day())?;
        Ok(stats::weekly(&rows, date))
    }

    pub fn all_time_stats(&self, today: NaiveDate) -> Result<AllTimeStats> {
        Ok(stats::all_time(&self.all_rows()?, today))
    }

    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// The shareable summary for `today`.
    pub fn share_text(&self, today: NaiveDate) -> Result<String> {
        Ok(stats::share_text(
            &self.daily_stats(today)?,
            &self.weekly_stats(today)?,
            &self.all_time_stats(today)?,
        ))
    }

    /// Delete every recorded session event. Persisted timer records stay.
    pub fn reset_stats(&self) -> Result<usize> {
        let removed = self.conn()?.execute("DELETE FROM sessions", [])?;
        info!(removed, "statistics reset");
        Ok(removed)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_remove(&self, keys: &[&str]) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for key in keys {
            tx.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        }
        tx.commit()?;
        Ok(())
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.kv_get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.kv_set(key, value)
    }

    fn remove(&self, keys: &[&str]) -> Result<()> {
        self.kv_remove(keys)
    }
}

impl StatisticsRecorder for Database {
    fn record_session_start(&self, kind: SessionKind) -> Result<()> {
        self.record_at(kind, SessionEvent::Started, 0, Utc::now())?;
        Ok(())
    }

    fn record_session_complete(&self, kind: SessionKind, duration_minutes: u32) -> Result<()> {
        self.record_at(kind, SessionEvent::Completed, duration_minutes, Utc::now())?;
        Ok(())
    }
}
