//! Folder use-case service.
//!
//! # Invariants
//! - Folder names are trimmed and must be non-empty.
//! - Duplicate names are rejected, never merged.

use crate::model::folder::{Folder, FolderSummary};
use crate::model::timestamp_now;
use crate::repo::folder_repo::FolderRepository;
use crate::repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for folder use-cases.
#[derive(Debug)]
pub enum FolderServiceError {
    /// Name is blank after trim.
    InvalidName,
    /// A folder with the same name already exists.
    ConstraintViolation(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for FolderServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "folder name must not be blank"),
            Self::ConstraintViolation(message) => write!(f, "constraint violation: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FolderServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for FolderServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ConstraintViolation(message) => Self::ConstraintViolation(message),
            other => Self::Repo(other),
        }
    }
}

/// Folder service facade over repository implementations.
pub struct FolderService<R: FolderRepository> {
    repo: R,
}

impl<R: FolderRepository> FolderService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one folder with a stamped `created_at`.
    pub fn create_folder(&self, name: &str) -> Result<Folder, FolderServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FolderServiceError::InvalidName);
        }

        match self.repo.create_folder(name, &timestamp_now()) {
            Ok(folder) => {
                info!(
                    "event=folder_create module=service status=ok folder_id={}",
                    folder.id
                );
                Ok(folder)
            }
            Err(err) => {
                warn!("event=folder_create module=service status=error error={err}");
                Err(err.into())
            }
        }
    }

    /// Gets one folder by name. Absence is `Ok(None)`.
    pub fn get_folder(&self, name: &str) -> Result<Option<Folder>, FolderServiceError> {
        Ok(self.repo.get_folder_by_name(name.trim())?)
    }

    /// Lists every folder with its note count.
    pub fn list_folders(&self) -> Result<Vec<FolderSummary>, FolderServiceError> {
        Ok(self.repo.list_folders()?)
    }
}
