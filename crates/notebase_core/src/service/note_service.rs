//! Note use-case service.
//!
//! # Responsibility
//! - Validate note/tag input above the repository layer.
//! - Stamp `created_at`/`updated_at`; callers never supply them.
//! - Interpret repository absence as `NoteNotFound` where a note is required.
//!
//! # Invariants
//! - Titles are trimmed and must be non-empty.
//! - Tag names are trimmed, inner whitespace runs collapse to one space.
//! - Blank optional strings (`folder`, `due_date`) are stored as `NULL`.
//! - Log lines carry ids and counts only, never titles or bodies.

use crate::model::note::{NewNote, Note, NoteId, NotePatch, TagCount};
use crate::model::timestamp_now;
use crate::repo::note_repo::NoteRepository;
use crate::repo::RepoError;
use crate::search::query::NoteQuery;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Lookup key for a single note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteKey {
    Id(NoteId),
    Title(String),
}

impl Display for NoteKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::Title(title) => write!(f, "title `{title}`"),
        }
    }
}

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Title is blank after trim.
    InvalidTitle,
    /// Tag input contains a blank value.
    InvalidTag(String),
    /// Target note does not exist.
    NoteNotFound(NoteKey),
    /// Unique-key conflict (title already taken).
    ConstraintViolation(String),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "note title must not be blank"),
            Self::InvalidTag(value) => write!(f, "invalid tag: `{value}`"),
            Self::NoteNotFound(key) => write!(f, "note not found: {key}"),
            Self::ConstraintViolation(message) => write!(f, "constraint violation: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ConstraintViolation(message) => Self::ConstraintViolation(message),
            other => Self::Repo(other),
        }
    }
}

pub type NoteServiceResult<T> = Result<T, NoteServiceError>;

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one note. The returned note has no tags.
    pub fn create_note(&self, note: NewNote) -> NoteServiceResult<Note> {
        let note = NewNote {
            title: normalize_title(&note.title)?,
            content: note.content,
            folder: blank_to_none(note.folder),
            priority: note.priority,
            due_date: blank_to_none(note.due_date),
        };

        let created = self
            .repo
            .create_note(&note, &timestamp_now())
            .inspect_err(|err| log_write_error("note_create", err))?;
        info!(
            "event=note_create module=service status=ok note_id={}",
            created.id
        );
        Ok(created)
    }

    /// Gets one note with its tags. Absence is `Ok(None)`.
    pub fn get_note(&self, key: &NoteKey) -> NoteServiceResult<Option<Note>> {
        let note = match key {
            NoteKey::Id(id) => self.repo.get_note_by_id(*id)?,
            NoteKey::Title(title) => self.repo.get_note_by_title(title.trim())?,
        };
        Ok(note)
    }

    /// Gets one note with its tags, treating absence as `NoteNotFound`.
    pub fn require_note(&self, key: &NoteKey) -> NoteServiceResult<Note> {
        self.get_note(key)?
            .ok_or_else(|| NoteServiceError::NoteNotFound(key.clone()))
    }

    /// Applies a partial update and returns the note as stored afterwards.
    pub fn update_note(&self, id: NoteId, patch: NotePatch) -> NoteServiceResult<Note> {
        let touch_only = patch.is_empty();
        let patch = NotePatch {
            title: patch.title.as_deref().map(normalize_title).transpose()?,
            content: patch.content,
            folder: patch.folder.map(blank_to_none),
            priority: patch.priority,
            due_date: patch.due_date.map(blank_to_none),
        };

        let updated = self
            .repo
            .update_note(id, &patch, &timestamp_now())
            .inspect_err(|err| log_write_error("note_update", err))?;
        if !updated {
            return Err(NoteServiceError::NoteNotFound(NoteKey::Id(id)));
        }
        info!("event=note_update module=service status=ok note_id={id} touch_only={touch_only}");

        self.repo
            .get_note_by_id(id)?
            .ok_or(NoteServiceError::InconsistentState(
                "updated note not found in read-back",
            ))
    }

    /// Deletes one note and all of its tags.
    pub fn delete_note(&mut self, id: NoteId) -> NoteServiceResult<()> {
        if !self.repo.delete_note(id)? {
            return Err(NoteServiceError::NoteNotFound(NoteKey::Id(id)));
        }
        info!("event=note_delete module=service status=ok note_id={id}");
        Ok(())
    }

    /// Adds tags to a note. Tags the note already carries are ignored.
    pub fn add_tags(&mut self, id: NoteId, tags: &[String]) -> NoteServiceResult<Note> {
        let tags = normalize_tags(tags)?;
        self.require_note(&NoteKey::Id(id))?;

        let added = self
            .repo
            .add_tags(id, &tags)
            .inspect_err(|err| log_write_error("tag_add", err))?;
        info!(
            "event=tag_add module=service status=ok note_id={id} requested={} added={added}",
            tags.len()
        );

        self.require_note(&NoteKey::Id(id))
    }

    /// Removes tags from a note. Names the note does not carry are ignored.
    pub fn remove_tags(&mut self, id: NoteId, tags: &[String]) -> NoteServiceResult<Note> {
        let tags = normalize_tags(tags)?;
        self.require_note(&NoteKey::Id(id))?;

        let removed = self.repo.remove_tags(id, &tags)?;
        info!(
            "event=tag_remove module=service status=ok note_id={id} requested={} removed={removed}",
            tags.len()
        );

        self.require_note(&NoteKey::Id(id))
    }

    /// Searches notes by text, filters, sort and pagination.
    pub fn search_notes(&self, query: &NoteQuery) -> NoteServiceResult<Vec<Note>> {
        let started_at = Instant::now();
        let notes = self.repo.search_notes(query)?;
        info!(
            "event=note_search module=service status=ok fields={} results={} duration_ms={}",
            query.effective_fields().len(),
            notes.len(),
            started_at.elapsed().as_millis()
        );
        Ok(notes)
    }

    /// Lists notes by folder/priority filters, sort and pagination.
    pub fn list_notes(&self, query: &NoteQuery) -> NoteServiceResult<Vec<Note>> {
        let started_at = Instant::now();
        let notes = self.repo.list_notes(query)?;
        info!(
            "event=note_list module=service status=ok results={} duration_ms={}",
            notes.len(),
            started_at.elapsed().as_millis()
        );
        Ok(notes)
    }

    /// Lists distinct tag names with note counts.
    pub fn list_tags(&self) -> NoteServiceResult<Vec<TagCount>> {
        Ok(self.repo.list_tags()?)
    }
}

/// Normalizes one tag value. Returns `None` for blank input.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(tag.trim(), " ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.into_owned())
    }
}

/// Normalizes and deduplicates tag values, keeping first-seen order.
///
/// Any blank value rejects the whole set.
pub fn normalize_tags(tags: &[String]) -> NoteServiceResult<Vec<String>> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let value = normalize_tag(tag).ok_or_else(|| NoteServiceError::InvalidTag(tag.clone()))?;
        if !normalized.contains(&value) {
            normalized.push(value);
        }
    }
    Ok(normalized)
}

fn normalize_title(title: &str) -> NoteServiceResult<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(NoteServiceError::InvalidTitle);
    }
    Ok(trimmed.to_string())
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn log_write_error(event: &str, err: &RepoError) {
    match err {
        RepoError::ConstraintViolation(_) => {
            warn!("event={event} module=service status=error error_code=constraint_violation")
        }
        other => warn!("event={event} module=service status=error error={other}"),
    }
}
