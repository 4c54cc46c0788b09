//! Core domain logic for notebase.
//! This crate is the single source of truth for note/folder/tag invariants
//! and owns every SQL statement the system runs.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use logging::{default_log_level, init_logging, init_stderr_logging, logging_status, LogTarget};
pub use model::folder::{Folder, FolderId, FolderSummary};
pub use model::note::{NewNote, Note, NoteId, NotePatch, Priority, TagCount};
pub use model::{timestamp_now, InvalidValue};
pub use repo::folder_repo::{FolderRepository, SqliteFolderRepository};
pub use repo::note_repo::{NoteRepository, SqliteNoteRepository};
pub use repo::{RepoError, RepoResult};
pub use search::query::{
    build_note_listing, build_note_query, NoteQuery, QueryPlan, SearchField, SortField, SortOrder,
};
pub use service::folder_service::{FolderService, FolderServiceError};
pub use service::note_service::{NoteKey, NoteService, NoteServiceError, NoteServiceResult};
pub use service::store::NoteStore;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
