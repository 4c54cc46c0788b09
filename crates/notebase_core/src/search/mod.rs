//! Note search entry points.
//!
//! # Responsibility
//! - Compose multi-field substring search, filters, sorting and pagination
//!   into a single parameterized statement.
//! - Keep result shaping (tag hydration) inside core.

pub mod query;
