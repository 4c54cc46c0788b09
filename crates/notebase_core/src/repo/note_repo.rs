//! Note/tag repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD persistence APIs over `notes` and their owned `tags`.
//! - Attach the tag set to every note read.
//! - Delegate filtered search/listing to the query builder.
//!
//! # Invariants
//! - `notes.title` uniqueness violations surface as `ConstraintViolation`.
//! - `update_note` writes only supplied fields plus `updated_at`.
//! - Tag add/remove never touches the owning note row.
//! - A multi-tag add or remove is all-or-nothing.
//! - `delete_note` removes tags and note in one transaction.

use crate::model::note::{NewNote, Note, NoteId, NotePatch, Priority, TagCount};
use crate::repo::{ensure_table_columns, RepoError, RepoResult};
use crate::search::query::{self, NoteQuery};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use std::collections::HashMap;

/// Column list shared by every note read, aliased on table `n`.
pub(crate) const NOTE_COLUMNS_SQL: &str =
    "n.id, n.title, n.content, n.folder, n.priority, n.due_date, n.created_at, n.updated_at";

/// Repository interface for note and tag operations.
pub trait NoteRepository {
    /// Inserts one note stamped with `stamp` and returns it with its new id.
    fn create_note(&self, note: &NewNote, stamp: &str) -> RepoResult<Note>;
    /// Gets one note by id with its tags.
    fn get_note_by_id(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Gets one note by exact title with its tags.
    fn get_note_by_title(&self, title: &str) -> RepoResult<Option<Note>>;
    /// Applies a partial update. Returns `false` when no row matched.
    fn update_note(&self, id: NoteId, patch: &NotePatch, stamp: &str) -> RepoResult<bool>;
    /// Deletes one note and its tags. Returns `false` when no row matched.
    fn delete_note(&mut self, id: NoteId) -> RepoResult<bool>;
    /// Adds tags to one note in one transaction. Returns the number of new
    /// pairs; names the note already carries are skipped.
    fn add_tags(&mut self, note_id: NoteId, names: &[String]) -> RepoResult<usize>;
    /// Removes the named tags from one note. Returns the number removed.
    fn remove_tags(&mut self, note_id: NoteId, names: &[String]) -> RepoResult<usize>;
    /// Returns tag names of one note ordered by name.
    fn tags_for_note(&self, note_id: NoteId) -> RepoResult<Vec<String>>;
    /// Returns every distinct tag name with its note count.
    fn list_tags(&self) -> RepoResult<Vec<TagCount>>;
    /// Runs a text search with filters, sort and pagination.
    fn search_notes(&self, query: &NoteQuery) -> RepoResult<Vec<Note>>;
    /// Lists notes by filters only; any query text is ignored.
    fn list_notes(&self, query: &NoteQuery) -> RepoResult<Vec<Note>>;
}

/// SQLite-backed note/tag repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_table_columns(
            conn,
            "notes",
            &[
                "id",
                "title",
                "content",
                "folder",
                "priority",
                "due_date",
                "created_at",
                "updated_at",
            ],
        )?;
        ensure_table_columns(conn, "tags", &["id", "name", "note_id"])?;
        Ok(Self { conn })
    }

    fn get_note_where(&self, predicate: &str, value: Value) -> RepoResult<Option<Note>> {
        let sql = format!("SELECT {NOTE_COLUMNS_SQL} FROM notes n WHERE {predicate};");
        let note = self
            .conn
            .query_row(&sql, [value], |row| Ok(parse_note_row(row)))
            .optional()?
            .transpose()?;

        match note {
            Some(mut note) => {
                note.tags = self.tags_for_note(note.id)?;
                Ok(Some(note))
            }
            None => Ok(None),
        }
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(&self, note: &NewNote, stamp: &str) -> RepoResult<Note> {
        self.conn.execute(
            "INSERT INTO notes (
                title,
                content,
                folder,
                priority,
                due_date,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6);",
            params![
                note.title.as_str(),
                note.content.as_str(),
                note.folder.as_deref(),
                note.priority.map(Priority::as_str),
                note.due_date.as_deref(),
                stamp,
            ],
        )?;

        Ok(Note {
            id: self.conn.last_insert_rowid(),
            title: note.title.clone(),
            content: note.content.clone(),
            folder: note.folder.clone(),
            priority: note.priority,
            due_date: note.due_date.clone(),
            created_at: stamp.to_string(),
            updated_at: stamp.to_string(),
            tags: Vec::new(),
        })
    }

    fn get_note_by_id(&self, id: NoteId) -> RepoResult<Option<Note>> {
        self.get_note_where("n.id = ?1", Value::Integer(id))
    }

    fn get_note_by_title(&self, title: &str) -> RepoResult<Option<Note>> {
        self.get_note_where("n.title = ?1", Value::Text(title.to_string()))
    }

    fn update_note(&self, id: NoteId, patch: &NotePatch, stamp: &str) -> RepoResult<bool> {
        let mut assignments: Vec<&'static str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(title) = patch.title.as_ref() {
            assignments.push("title = ?");
            bind_values.push(Value::Text(title.clone()));
        }
        if let Some(content) = patch.content.as_ref() {
            assignments.push("content = ?");
            bind_values.push(Value::Text(content.clone()));
        }
        if let Some(folder) = patch.folder.as_ref() {
            assignments.push("folder = ?");
            bind_values.push(optional_text(folder.as_deref()));
        }
        if let Some(priority) = patch.priority {
            assignments.push("priority = ?");
            bind_values.push(optional_text(priority.map(Priority::as_str)));
        }
        if let Some(due_date) = patch.due_date.as_ref() {
            assignments.push("due_date = ?");
            bind_values.push(optional_text(due_date.as_deref()));
        }

        assignments.push("updated_at = ?");
        bind_values.push(Value::Text(stamp.to_string()));
        bind_values.push(Value::Integer(id));

        let sql = format!("UPDATE notes SET {} WHERE id = ?;", assignments.join(", "));
        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        Ok(changed > 0)
    }

    fn delete_note(&mut self, id: NoteId) -> RepoResult<bool> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM tags WHERE note_id = ?1;", [id])?;
        let changed = tx.execute("DELETE FROM notes WHERE id = ?1;", [id])?;
        tx.commit()?;
        Ok(changed > 0)
    }

    fn add_tags(&mut self, note_id: NoteId, names: &[String]) -> RepoResult<usize> {
        if names.is_empty() {
            return Ok(0);
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut inserted = 0;
        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO tags (name, note_id) VALUES (?1, ?2);")?;
            for name in names {
                inserted += stmt.execute(params![name.as_str(), note_id])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn remove_tags(&mut self, note_id: NoteId, names: &[String]) -> RepoResult<usize> {
        if names.is_empty() {
            return Ok(0);
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut removed = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM tags WHERE note_id = ?1 AND name = ?2;")?;
            for name in names {
                removed += stmt.execute(params![note_id, name.as_str()])?;
            }
        }
        tx.commit()?;
        Ok(removed)
    }

    fn tags_for_note(&self, note_id: NoteId) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM tags WHERE note_id = ?1 ORDER BY name ASC;")?;
        let mut rows = stmt.query([note_id])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(row.get(0)?);
        }
        Ok(tags)
    }

    fn list_tags(&self) -> RepoResult<Vec<TagCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, COUNT(*) AS note_count
             FROM tags
             GROUP BY name
             ORDER BY name ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(TagCount {
                name: row.get("name")?,
                note_count: row.get("note_count")?,
            });
        }
        Ok(tags)
    }

    fn search_notes(&self, query: &NoteQuery) -> RepoResult<Vec<Note>> {
        query::search_notes(&*self.conn, query)
    }

    fn list_notes(&self, query: &NoteQuery) -> RepoResult<Vec<Note>> {
        query::list_notes(&*self.conn, query)
    }
}

/// Decodes one row selected with [`NOTE_COLUMNS_SQL`]; `tags` is left empty.
pub(crate) fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let priority = match row.get::<_, Option<String>>("priority")? {
        Some(value) => Some(value.parse::<Priority>().map_err(|_| {
            RepoError::InvalidData(format!("invalid priority `{value}` in notes.priority"))
        })?),
        None => None,
    };

    Ok(Note {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        folder: row.get("folder")?,
        priority,
        due_date: row.get("due_date")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        tags: Vec::new(),
    })
}

/// Loads tag names for a set of notes in one statement.
pub(crate) fn load_tags_for_notes(
    conn: &Connection,
    note_ids: &[NoteId],
) -> RepoResult<HashMap<NoteId, Vec<String>>> {
    let mut tags: HashMap<NoteId, Vec<String>> = HashMap::new();
    if note_ids.is_empty() {
        return Ok(tags);
    }

    let placeholders = vec!["?"; note_ids.len()].join(", ");
    let sql = format!(
        "SELECT note_id, name
         FROM tags
         WHERE note_id IN ({placeholders})
         ORDER BY note_id ASC, name ASC;"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(note_ids.iter()))?;
    while let Some(row) = rows.next()? {
        let note_id: NoteId = row.get(0)?;
        tags.entry(note_id).or_default().push(row.get(1)?);
    }
    Ok(tags)
}

fn optional_text(value: Option<&str>) -> Value {
    match value {
        Some(text) => Value::Text(text.to_string()),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::{NoteRepository, SqliteNoteRepository};
    use crate::db::open_db_in_memory;
    use crate::model::note::{NewNote, NotePatch, Priority};
    use crate::repo::RepoError;

    const STAMP: &str = "2024-01-15T10:30:00.000Z";
    const LATER: &str = "2024-01-16T08:00:00.000Z";

    #[test]
    fn update_with_empty_patch_only_touches_updated_at() {
        let mut conn = open_db_in_memory().unwrap();
        let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        let note = repo
            .create_note(
                &NewNote::new("Plan", "body").with_priority(Priority::Low),
                STAMP,
            )
            .unwrap();

        assert!(repo.update_note(note.id, &NotePatch::default(), LATER).unwrap());
        let loaded = repo.get_note_by_id(note.id).unwrap().unwrap();
        assert_eq!(loaded.updated_at, LATER);
        assert_eq!(loaded.created_at, STAMP);
        assert_eq!(loaded.priority, Some(Priority::Low));
    }

    #[test]
    fn update_can_clear_nullable_fields() {
        let mut conn = open_db_in_memory().unwrap();
        let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        let note = repo
            .create_note(
                &NewNote::new("Trip", "pack")
                    .with_folder("travel")
                    .with_due_date("2024-07-01"),
                STAMP,
            )
            .unwrap();

        let patch = NotePatch {
            folder: Some(None),
            due_date: Some(None),
            ..NotePatch::default()
        };
        repo.update_note(note.id, &patch, LATER).unwrap();

        let loaded = repo.get_note_by_id(note.id).unwrap().unwrap();
        assert_eq!(loaded.folder, None);
        assert_eq!(loaded.due_date, None);
        assert_eq!(loaded.content, "pack");
    }

    #[test]
    fn renaming_onto_existing_title_is_constraint_violation() {
        let mut conn = open_db_in_memory().unwrap();
        let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        repo.create_note(&NewNote::new("A", ""), STAMP).unwrap();
        let b = repo.create_note(&NewNote::new("B", ""), STAMP).unwrap();

        let patch = NotePatch {
            title: Some("A".to_string()),
            ..NotePatch::default()
        };
        let err = repo.update_note(b.id, &patch, LATER).unwrap_err();
        assert!(matches!(err, RepoError::ConstraintViolation(_)));
        let still_b = repo.get_note_by_id(b.id).unwrap().unwrap();
        assert_eq!(still_b.title, "B");
    }

    #[test]
    fn invalid_persisted_priority_is_rejected() {
        let mut conn = open_db_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA ignore_check_constraints = ON;
             INSERT INTO notes (title, content, priority, created_at, updated_at)
             VALUES ('bad', '', 'urgent', 'x', 'x');",
        )
        .unwrap();
        let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        let err = repo.get_note_by_title("bad").unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(ref msg) if msg.contains("urgent")));
    }
}
