//! Folder domain model.

use serde::{Deserialize, Serialize};

/// Storage-assigned folder identity.
pub type FolderId = i64;

/// A named grouping label. Notes reference folders by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    pub created_at: String,
}

/// Folder listing row with the number of notes naming it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderSummary {
    #[serde(flatten)]
    pub folder: Folder,
    pub note_count: u32,
}
