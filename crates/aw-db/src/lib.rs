//! Storage layer for the presence watcher.
//!
//! Provides persistence for session rows using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! Async callers wrap it in a `Mutex` and run each call on a blocking thread.
//!
//! # Schema
//!
//! A single `bot_times` table holds one row per session. `id` is the ordering
//! key: the latest session is the row with the largest `id`, which stays
//! unambiguous even when two rows share a `starts` value.
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 format with millisecond precision
//! (e.g., `2024-01-15T10:30:00.000Z`), so lexicographic ordering matches
//! chronological ordering. `starts` is filled in by the column default.
//!
//! ## Durations
//!
//! `online_time` and `offline_time` hold INTEGER milliseconds. NULL means no
//! time has been accrued yet and reads as zero in totals.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use thiserror::Error;

use aw_core::{Accrual, SessionRecord, offline_accrual, online_accrual};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored timestamp could not be parsed.
    #[error("invalid {column} timestamp for session {id}: {value}")]
    TimestampParse {
        id: i64,
        column: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored duration does not fit a `TimeDelta`.
    #[error("duration out of range: {0}ms")]
    DurationOverflow(i64),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Aggregate accounting over every session row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTotals {
    pub sessions: i64,
    /// Sum of per-session online time.
    pub online_time: TimeDelta,
    /// Cumulative offline time carried by the latest row.
    pub offline_time: TimeDelta,
}

/// Session row as stored, before timestamp and duration parsing.
struct SessionRow {
    id: i64,
    starts: String,
    joined: Option<String>,
    leave: Option<String>,
    online_time_ms: Option<i64>,
    offline_time_ms: Option<i64>,
}

const SESSION_COLUMNS: &str = "id, starts, joined, leave, online_time, offline_time";

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- bot_times: one row per watch session
            -- starts/joined/leave: RFC 3339 with milliseconds (e.g., '2024-01-15T10:30:00.000Z')
            -- online_time/offline_time: accrued milliseconds, NULL until first accrual
            CREATE TABLE IF NOT EXISTS bot_times (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                starts TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                joined TEXT,
                leave TEXT,
                online_time INTEGER,
                offline_time INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_bot_times_starts ON bot_times(starts);
            ",
        )?;
        Ok(())
    }

    /// Returns the latest session, if any.
    pub fn latest_session(&self) -> Result<Option<SessionRecord>, DbError> {
        latest_session(&self.conn)
    }

    /// Opens a new session row. `starts` is assigned by the database.
    pub fn insert_session(
        &mut self,
        joined: DateTime<Utc>,
        offline_time: Option<TimeDelta>,
    ) -> Result<i64, DbError> {
        insert_session(&self.conn, joined, offline_time)
    }

    /// Closes out the latest session row.
    ///
    /// The target row is resolved inside the statement, not from an earlier
    /// read. Returns the number of rows changed, which is zero on an empty table.
    pub fn update_latest_session(
        &mut self,
        leave: DateTime<Utc>,
        online_time: TimeDelta,
    ) -> Result<usize, DbError> {
        update_latest_session(&self.conn, leave, online_time)
    }

    /// Records that the watched user became present at `now`.
    ///
    /// Reads the latest row, derives the offline time to carry forward and
    /// inserts a new session, all inside one immediate transaction.
    pub fn record_started_at(&mut self, now: DateTime<Utc>) -> Result<Accrual, DbError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let last = latest_session(&tx)?;
        let accrual = offline_accrual(last.as_ref(), now);
        if accrual.basis.is_degenerate() {
            tracing::warn!(
                basis = ?accrual.basis,
                previous = last.as_ref().map(|row| row.id),
                "previous session has no leave time; offline time mixes in an absolute instant"
            );
        }
        let id = insert_session(&tx, now, Some(accrual.duration))?;
        tx.commit()?;
        tracing::debug!(id, offline_ms = accrual.duration.num_milliseconds(), "opened session");
        Ok(accrual)
    }

    /// Records that the watched user went offline at `now`.
    ///
    /// Reads the latest row, adds the span since it was joined to its online
    /// time and writes it back, all inside one immediate transaction.
    pub fn record_stopped_at(&mut self, now: DateTime<Utc>) -> Result<Accrual, DbError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let last = latest_session(&tx)?;
        let accrual = online_accrual(last.as_ref(), now);
        if accrual.basis.is_degenerate() {
            tracing::warn!(
                basis = ?accrual.basis,
                previous = last.as_ref().map(|row| row.id),
                "latest session has no joined time; no online span accrued"
            );
        }
        let updated = update_latest_session(&tx, now, accrual.duration)?;
        tx.commit()?;
        tracing::debug!(
            updated,
            online_ms = accrual.duration.num_milliseconds(),
            "closed session"
        );
        Ok(accrual)
    }

    /// Lists sessions, newest first.
    pub fn list_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>, DbError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM bot_times ORDER BY id DESC LIMIT ?"
        ))?;
        let rows = stmt.query_map([limit], session_row)?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?.into_record()?);
        }
        Ok(sessions)
    }

    /// Totals accrued time over all sessions.
    ///
    /// Online time is per session and is summed. Offline time already chains
    /// from row to row, so the latest row's value is the total.
    pub fn session_totals(&self) -> Result<SessionTotals, DbError> {
        let (sessions, online_ms, offline_ms): (i64, i64, i64) = self.conn.query_row(
            "
            SELECT
                COUNT(*),
                COALESCE(SUM(online_time), 0),
                COALESCE(
                    (SELECT offline_time FROM bot_times
                     WHERE id = (SELECT MAX(id) FROM bot_times)),
                    0
                )
            FROM bot_times
            ",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        Ok(SessionTotals {
            sessions,
            online_time: duration_from_ms(online_ms)?,
            offline_time: duration_from_ms(offline_ms)?,
        })
    }
}

fn latest_session(conn: &Connection) -> Result<Option<SessionRecord>, DbError> {
    conn.query_row(
        &format!(
            "SELECT {SESSION_COLUMNS} FROM bot_times WHERE id = (SELECT MAX(id) FROM bot_times)"
        ),
        [],
        session_row,
    )
    .optional()?
    .map(SessionRow::into_record)
    .transpose()
}

fn insert_session(
    conn: &Connection,
    joined: DateTime<Utc>,
    offline_time: Option<TimeDelta>,
) -> Result<i64, DbError> {
    conn.execute(
        "INSERT INTO bot_times (joined, offline_time) VALUES (?, ?)",
        params![
            format_timestamp(joined),
            offline_time.map(|delta| delta.num_milliseconds())
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn update_latest_session(
    conn: &Connection,
    leave: DateTime<Utc>,
    online_time: TimeDelta,
) -> Result<usize, DbError> {
    let updated = conn.execute(
        "
        UPDATE bot_times SET leave = ?, online_time = ?
        WHERE id = (SELECT MAX(id) FROM bot_times)
        ",
        params![format_timestamp(leave), online_time.num_milliseconds()],
    )?;
    Ok(updated)
}

fn session_row(row: &Row<'_>) -> rusqlite::Result<SessionRow> {
    Ok(SessionRow {
        id: row.get(0)?,
        starts: row.get(1)?,
        joined: row.get(2)?,
        leave: row.get(3)?,
        online_time_ms: row.get(4)?,
        offline_time_ms: row.get(5)?,
    })
}

impl SessionRow {
    fn into_record(self) -> Result<SessionRecord, DbError> {
        let id = self.id;
        Ok(SessionRecord {
            id,
            starts: parse_timestamp(&self.starts, id, "starts")?,
            joined: self
                .joined
                .map(|value| parse_timestamp(&value, id, "joined"))
                .transpose()?,
            leave: self
                .leave
                .map(|value| parse_timestamp(&value, id, "leave"))
                .transpose()?,
            online_time: self.online_time_ms.map(duration_from_ms).transpose()?,
            offline_time: self.offline_time_ms.map(duration_from_ms).transpose()?,
        })
    }
}

fn parse_timestamp(value: &str, id: i64, column: &'static str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            id,
            column,
            value: value.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn duration_from_ms(ms: i64) -> Result<TimeDelta, DbError> {
    TimeDelta::try_milliseconds(ms).ok_or(DbError::DurationOverflow(ms))
}
