//! Note domain model.
//!
//! # Invariants
//! - `id` is assigned by storage on creation and never changes.
//! - `title` is non-empty and unique across all notes.
//! - `tags` is hydrated on every read and never written through `Note`.

use super::InvalidValue;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Storage-assigned note identity.
pub type NoteId = i64;

/// Optional importance marker on a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Returns the persisted spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = InvalidValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(InvalidValue {
                kind: "priority",
                value: value.to_string(),
                expected: "low|medium|high",
            }),
        }
    }
}

/// A stored note with its tag set attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    /// Folder name; a soft reference with no integrity enforcement.
    pub folder: Option<String>,
    pub priority: Option<Priority>,
    /// Opaque ISO-8601 date string, stored as given.
    pub due_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Tag names ordered by name.
    pub tags: Vec<String>,
}

/// Creation payload. Identity and timestamps are assigned by the core.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub folder: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<String>,
}

impl NewNote {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }
}

/// Partial update payload with PATCH semantics.
///
/// `None` leaves a field untouched. For nullable columns the inner option
/// distinguishes "set to value" (`Some(Some(v))`) from "clear" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub folder: Option<Option<String>>,
    pub priority: Option<Option<Priority>>,
    pub due_date: Option<Option<String>>,
}

impl NotePatch {
    /// Returns `true` when no field would change.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.folder.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }
}

/// A distinct tag name and the number of notes carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub name: String,
    pub note_count: u32,
}

#[cfg(test)]
mod tests {
    use super::{NotePatch, Priority};

    #[test]
    fn priority_parses_case_insensitively() {
        assert_eq!(" HIGH ".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("low".parse::<Priority>().unwrap(), Priority::Low);
    }

    #[test]
    fn priority_rejects_unknown_value() {
        let err = "urgent".parse::<Priority>().unwrap_err();
        assert_eq!(err.kind, "priority");
        assert!(err.to_string().contains("low|medium|high"));
    }

    #[test]
    fn priority_serializes_lowercase() {
        let json = serde_json::to_string(&Priority::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
    }

    #[test]
    fn default_patch_is_empty() {
        assert!(NotePatch::default().is_empty());
        let patch = NotePatch {
            folder: Some(None),
            ..NotePatch::default()
        };
        assert!(!patch.is_empty());
    }
}
