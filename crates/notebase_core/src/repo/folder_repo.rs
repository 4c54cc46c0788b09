//! Folder repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `folders.name` uniqueness violations surface as `ConstraintViolation`.
//! - Folders are never mutated or deleted through this repository.
//! - Note counts follow the soft `notes.folder` reference by name.

use crate::model::folder::{Folder, FolderSummary};
use crate::repo::{ensure_table_columns, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Repository interface for folder operations.
pub trait FolderRepository {
    /// Inserts one folder stamped with `stamp`.
    fn create_folder(&self, name: &str, stamp: &str) -> RepoResult<Folder>;
    /// Gets one folder by exact name.
    fn get_folder_by_name(&self, name: &str) -> RepoResult<Option<Folder>>;
    /// Lists all folders by name with the number of notes naming each.
    fn list_folders(&self) -> RepoResult<Vec<FolderSummary>>;
}

/// SQLite-backed folder repository.
pub struct SqliteFolderRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFolderRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_columns(conn, "folders", &["id", "name", "created_at"])?;
        Ok(Self { conn })
    }
}

impl FolderRepository for SqliteFolderRepository<'_> {
    fn create_folder(&self, name: &str, stamp: &str) -> RepoResult<Folder> {
        self.conn.execute(
            "INSERT INTO folders (name, created_at) VALUES (?1, ?2);",
            params![name, stamp],
        )?;

        Ok(Folder {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            created_at: stamp.to_string(),
        })
    }

    fn get_folder_by_name(&self, name: &str) -> RepoResult<Option<Folder>> {
        let folder = self
            .conn
            .query_row(
                "SELECT id, name, created_at FROM folders WHERE name = ?1;",
                [name],
                parse_folder_row,
            )
            .optional()?;
        Ok(folder)
    }

    fn list_folders(&self) -> RepoResult<Vec<FolderSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                f.id,
                f.name,
                f.created_at,
                (SELECT COUNT(*) FROM notes n WHERE n.folder = f.name) AS note_count
             FROM folders f
             ORDER BY f.name ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut folders = Vec::new();
        while let Some(row) = rows.next()? {
            folders.push(FolderSummary {
                folder: parse_folder_row(row)?,
                note_count: row.get("note_count")?,
            });
        }
        Ok(folders)
    }
}

fn parse_folder_row(row: &Row<'_>) -> rusqlite::Result<Folder> {
    Ok(Folder {
        id: row.get("id")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
    })
}
