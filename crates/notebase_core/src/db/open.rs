//! Connection opening and per-connection setup.
//!
//! # Invariants
//! - Returned connections enforce foreign keys.
//! - Returned connections are migrated to the latest schema.
//! - File databases run in WAL mode; in-memory ones keep SQLite's default.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

enum Location {
    File(PathBuf),
    Memory,
}

impl Location {
    fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }

    fn connect(&self) -> rusqlite::Result<Connection> {
        match self {
            Self::File(path) => Connection::open(path),
            Self::Memory => Connection::open_in_memory(),
        }
    }
}

/// Opens (creating if needed) a database file and migrates it.
///
/// Logs one `db_open` event on completion, with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open(Location::File(path.as_ref().to_path_buf()))
}

/// Opens a private in-memory database and migrates it.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open(Location::Memory)
}

fn open(location: Location) -> DbResult<Connection> {
    let started_at = Instant::now();
    let fail = |stage: &str, err: DbError| {
        error!(
            "event=db_open module=db status=error mode={} duration_ms={} error_code={stage} error={err}",
            location.mode(),
            started_at.elapsed().as_millis()
        );
        err
    };

    let mut conn = location
        .connect()
        .map_err(|err| fail("db_open_failed", err.into()))?;
    let steps = configure(&mut conn, &location).map_err(|err| fail("db_bootstrap_failed", err))?;

    info!(
        "event=db_open module=db status=ok mode={} migrations_applied={steps} duration_ms={}",
        location.mode(),
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}

fn configure(conn: &mut Connection, location: &Location) -> DbResult<usize> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    if let Location::File(_) = location {
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    }
    apply_migrations(conn)
}
