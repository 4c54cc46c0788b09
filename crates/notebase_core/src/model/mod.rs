//! Domain model for notes, folders and tags.
//!
//! # Responsibility
//! - Define the value objects exchanged across the core boundary.
//! - Parse string-keyed enum values once, at the boundary.
//!
//! # Invariants
//! - Timestamps are RFC 3339 UTC strings with millisecond precision, so
//!   lexicographic and chronological order agree.
//! - Timestamps issued by one process strictly increase.

use chrono::{DateTime, SecondsFormat, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicI64, Ordering};

pub mod folder;
pub mod note;

static LAST_STAMP_MILLIS: AtomicI64 = AtomicI64::new(i64::MIN);

/// Returns the current instant formatted the way the store persists it.
///
/// Two calls within the same millisecond get distinct stamps: the later
/// one is pushed one millisecond past the last stamp issued.
pub fn timestamp_now() -> String {
    let now = Utc::now();
    let now_millis = now.timestamp_millis();
    let previous = LAST_STAMP_MILLIS
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
            Some(now_millis.max(last.saturating_add(1)))
        })
        .unwrap_or(now_millis);
    let issued = now_millis.max(previous.saturating_add(1));

    DateTime::<Utc>::from_timestamp_millis(issued)
        .unwrap_or(now)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A string value that does not name any variant of a tagged enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidValue {
    /// Human-readable name of the expected value kind (`priority`, ...).
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
    /// Accepted spellings, `|`-separated.
    pub expected: &'static str,
}

impl Display for InvalidValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid {} `{}`; expected {}",
            self.kind, self.value, self.expected
        )
    }
}

impl Error for InvalidValue {}
