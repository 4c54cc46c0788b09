//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep handler/protocol layers decoupled from storage details.

pub mod folder_service;
pub mod note_service;
pub mod store;
