//! Serialized access point to the single SQLite connection.
//!
//! # Responsibility
//! - Own the process-wide connection behind a mutex.
//! - Build repositories and services per call on the locked connection.
//!
//! # Invariants
//! - At most one operation touches the connection at a time.
//! - A poisoned lock is recovered: SQLite rolls back any transaction that
//!   was open when the panicking holder dropped it.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::repo::folder_repo::SqliteFolderRepository;
use crate::repo::note_repo::SqliteNoteRepository;
use crate::service::folder_service::{FolderService, FolderServiceError};
use crate::service::note_service::{NoteService, NoteServiceError};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Mutex-guarded owner of the notebase connection.
pub struct NoteStore {
    conn: Mutex<Connection>,
}

impl NoteStore {
    /// Opens (and migrates) a file-backed store.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens (and migrates) an in-memory store.
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Runs `f` with exclusive access to a note service.
    pub fn with_notes<T>(
        &self,
        f: impl FnOnce(&mut NoteService<SqliteNoteRepository<'_>>) -> Result<T, NoteServiceError>,
    ) -> Result<T, NoteServiceError> {
        let mut conn = self.lock();
        let repo = SqliteNoteRepository::try_new(&mut conn)?;
        let mut service = NoteService::new(repo);
        f(&mut service)
    }

    /// Runs `f` with exclusive access to a folder service.
    pub fn with_folders<T>(
        &self,
        f: impl FnOnce(&FolderService<SqliteFolderRepository<'_>>) -> Result<T, FolderServiceError>,
    ) -> Result<T, FolderServiceError> {
        let conn = self.lock();
        let repo = SqliteFolderRepository::try_new(&conn)?;
        f(&FolderService::new(repo))
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
