//! Async access to the session database.
//!
//! `rusqlite` calls block, so every operation runs on tokio's blocking pool
//! while the event loop keeps going. The connection sits behind a mutex,
//! which also keeps each read-modify-write accounting step exclusive.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use aw_core::{Accrual, SessionRecord};
use aw_db::{Database, DbError};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors from the async session store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database call failed.
    #[error(transparent)]
    Db(#[from] DbError),
    /// The blocking task panicked or was cancelled.
    #[error("database task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Shared handle to the session database.
///
/// Cloning is cheap; all clones use the same connection, which closes when
/// the last clone is dropped.
#[derive(Clone)]
pub struct SessionStore {
    db: Arc<Mutex<Database>>,
}

impl SessionStore {
    /// Opens (and if needed creates) the database at `path`.
    pub async fn open(path: PathBuf) -> Result<Self, StoreError> {
        let db = tokio::task::spawn_blocking(move || Database::open(&path)).await??;
        Ok(Self::from_database(db))
    }

    /// Wraps an already-open database.
    pub fn from_database(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    async fn run_blocking<F, R>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut Database) -> Result<R, DbError> + Send + 'static,
        R: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let result = tokio::task::spawn_blocking(move || {
            // Writes are single statements or transactions, so a poisoned lock
            // still guards consistent rows.
            let mut guard = db.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut guard)
        })
        .await??;
        Ok(result)
    }

    /// Opens a new session at `now`, carrying the offline gap forward.
    pub async fn record_started(&self, now: DateTime<Utc>) -> Result<Accrual, StoreError> {
        self.run_blocking(move |db| db.record_started_at(now)).await
    }

    /// Closes the latest session at `now`, accruing its online span.
    pub async fn record_stopped(&self, now: DateTime<Utc>) -> Result<Accrual, StoreError> {
        self.run_blocking(move |db| db.record_stopped_at(now)).await
    }

    /// Returns the latest session, if any.
    pub async fn latest_session(&self) -> Result<Option<SessionRecord>, StoreError> {
        self.run_blocking(|db| db.latest_session()).await
    }
}
