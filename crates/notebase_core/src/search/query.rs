//! Note query builder: filtered, sorted, paginated substring search.
//!
//! # Responsibility
//! - Translate a [`NoteQuery`] into one parameterized SQL statement.
//! - Hydrate the tag list of every returned note after pagination.
//!
//! # Invariants
//! - User text is only ever bound as a parameter, never spliced into SQL.
//! - The tags relation is joined only when tags are searched by text.
//! - Deduplication happens before `ORDER BY`/`LIMIT`/`OFFSET`.
//! - `OFFSET` is emitted only together with `LIMIT`.
//! - Ordering is total: ties on the sort column fall back to `id`.

use crate::model::note::{Note, NoteId, Priority};
use crate::model::InvalidValue;
use crate::repo::note_repo::{load_tags_for_notes, parse_note_row, NOTE_COLUMNS_SQL};
use crate::repo::RepoResult;
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::str::FromStr;

/// Note field a free-text query can match against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    Title,
    Content,
    Tags,
}

impl SearchField {
    /// Fields searched when the caller names none.
    pub const DEFAULT: [SearchField; 2] = [SearchField::Title, SearchField::Content];

    fn column(self) -> &'static str {
        match self {
            Self::Title => "n.title",
            Self::Content => "n.content",
            Self::Tags => "t.name",
        }
    }
}

impl FromStr for SearchField {
    type Err = InvalidValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(Self::Title),
            "content" => Ok(Self::Content),
            "tags" | "tag" => Ok(Self::Tags),
            _ => Err(InvalidValue {
                kind: "search field",
                value: value.to_string(),
                expected: "title|content|tags",
            }),
        }
    }
}

/// Column a result set is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    #[default]
    UpdatedAt,
    /// Ordered lexicographically on the stored string. This matches calendar
    /// order only while every due date uses the same ISO-8601 precision and
    /// zone convention. Notes without a due date always sort last.
    DueDate,
}

impl FromStr for SortField {
    type Err = InvalidValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "createdat" | "created_at" => Ok(Self::CreatedAt),
            "updatedat" | "updated_at" => Ok(Self::UpdatedAt),
            "duedate" | "due_date" => Ok(Self::DueDate),
            _ => Err(InvalidValue {
                kind: "sort field",
                value: value.to_string(),
                expected: "createdAt|updatedAt|dueDate",
            }),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = InvalidValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(InvalidValue {
                kind: "sort order",
                value: value.to_string(),
                expected: "asc|desc",
            }),
        }
    }
}

/// Structured search/list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteQuery {
    /// Substring to look for, matched verbatim. `None` or `""` disables the
    /// text predicate.
    pub text: Option<String>,
    /// Fields the text is matched against. Empty means [`SearchField::DEFAULT`].
    pub fields: Vec<SearchField>,
    /// Exact folder name filter.
    pub folder: Option<String>,
    /// Exact priority filter.
    pub priority: Option<Priority>,
    pub sort: SortField,
    pub order: SortOrder,
    /// Maximum rows to return. `None` returns every match.
    pub limit: Option<u32>,
    /// Rows to skip. Ignored unless `limit` is set.
    pub offset: u32,
}

impl NoteQuery {
    /// Creates a text search over the default fields.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn in_fields(mut self, fields: impl IntoIterator<Item = SearchField>) -> Self {
        self.fields = fields.into_iter().collect();
        self
    }

    pub fn in_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn sorted_by(mut self, sort: SortField, order: SortOrder) -> Self {
        self.sort = sort;
        self.order = order;
        self
    }

    pub fn paged(mut self, limit: Option<u32>, offset: u32) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    /// Requested fields with duplicates removed, or the defaults.
    pub fn effective_fields(&self) -> Vec<SearchField> {
        let mut fields: Vec<SearchField> = Vec::new();
        for field in &self.fields {
            if !fields.contains(field) {
                fields.push(*field);
            }
        }
        if fields.is_empty() {
            fields.extend(SearchField::DEFAULT);
        }
        fields
    }

    fn active_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|text| !text.is_empty())
    }
}

/// SQL statement and bind values produced for one [`NoteQuery`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub sql: String,
    pub binds: Vec<Value>,
    /// Whether the statement joins the tags relation.
    pub joins_tags: bool,
}

/// Builds the statement for a search, honoring the text predicate.
pub fn build_note_query(query: &NoteQuery) -> QueryPlan {
    build_plan(query, query.active_text())
}

/// Builds the statement for a listing; any query text is ignored.
pub fn build_note_listing(query: &NoteQuery) -> QueryPlan {
    build_plan(query, None)
}

/// Runs a text search and returns the page with tags attached.
pub fn search_notes(conn: &Connection, query: &NoteQuery) -> RepoResult<Vec<Note>> {
    execute_plan(conn, &build_note_query(query))
}

/// Lists notes by folder/priority filters with sort and pagination.
pub fn list_notes(conn: &Connection, query: &NoteQuery) -> RepoResult<Vec<Note>> {
    execute_plan(conn, &build_note_listing(query))
}

/// Escapes `LIKE` wildcards so `text` matches literally under `ESCAPE '\'`.
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn build_plan(query: &NoteQuery, text: Option<&str>) -> QueryPlan {
    let fields = query.effective_fields();
    let joins_tags = text.is_some() && fields.contains(&SearchField::Tags);

    let mut sql = if joins_tags {
        format!(
            "SELECT DISTINCT {NOTE_COLUMNS_SQL}
             FROM notes n
             LEFT JOIN tags t ON t.note_id = n.id"
        )
    } else {
        format!("SELECT {NOTE_COLUMNS_SQL} FROM notes n")
    };
    sql.push_str(" WHERE 1 = 1");
    let mut binds: Vec<Value> = Vec::new();

    if let Some(text) = text {
        let pattern = format!("%{}%", escape_like(text));
        let clauses = fields
            .iter()
            .map(|field| format!("{} LIKE ? ESCAPE '\\'", field.column()))
            .collect::<Vec<_>>();
        sql.push_str(&format!(" AND ({})", clauses.join(" OR ")));
        binds.extend(fields.iter().map(|_| Value::Text(pattern.clone())));
    }

    if let Some(folder) = query.folder.as_ref() {
        sql.push_str(" AND n.folder = ?");
        binds.push(Value::Text(folder.clone()));
    }

    if let Some(priority) = query.priority {
        sql.push_str(" AND n.priority = ?");
        binds.push(Value::Text(priority.as_str().to_string()));
    }

    let direction = query.order.keyword();
    match query.sort {
        SortField::CreatedAt => {
            sql.push_str(&format!(" ORDER BY n.created_at {direction}, n.id {direction}"));
        }
        SortField::UpdatedAt => {
            sql.push_str(&format!(" ORDER BY n.updated_at {direction}, n.id {direction}"));
        }
        SortField::DueDate => {
            sql.push_str(&format!(
                " ORDER BY (n.due_date IS NULL) ASC, n.due_date {direction}, n.id {direction}"
            ));
        }
    }

    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        binds.push(Value::Integer(i64::from(limit)));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            binds.push(Value::Integer(i64::from(query.offset)));
        }
    }

    QueryPlan {
        sql,
        binds,
        joins_tags,
    }
}

fn execute_plan(conn: &Connection, plan: &QueryPlan) -> RepoResult<Vec<Note>> {
    debug!(
        "event=note_query module=search status=start joins_tags={} bind_count={}",
        plan.joins_tags,
        plan.binds.len()
    );

    let mut stmt = conn.prepare(&plan.sql)?;
    let mut rows = stmt.query(params_from_iter(plan.binds.iter()))?;
    let mut notes = Vec::new();
    while let Some(row) = rows.next()? {
        notes.push(parse_note_row(row)?);
    }

    let ids = notes.iter().map(|note| note.id).collect::<Vec<NoteId>>();
    let mut tags = load_tags_for_notes(conn, &ids)?;
    for note in &mut notes {
        note.tags = tags.remove(&note.id).unwrap_or_default();
    }

    Ok(notes)
}

#[cfg(test)]
mod tests {
    use super::{
        build_note_listing, build_note_query, escape_like, NoteQuery, SearchField, SortField,
        SortOrder,
    };
    use crate::model::note::Priority;
    use rusqlite::types::Value;

    #[test]
    fn default_fields_do_not_join_tags() {
        let plan = build_note_query(&NoteQuery::text("milk"));
        assert!(!plan.joins_tags);
        assert!(!plan.sql.contains("JOIN"));
        assert!(plan.sql.contains("n.title LIKE ? ESCAPE '\\' OR n.content LIKE ?"));
        assert_eq!(plan.binds, vec![Value::Text("%milk%".to_string()); 2]);
    }

    #[test]
    fn tags_field_joins_and_dedups() {
        let plan =
            build_note_query(&NoteQuery::text("a").in_fields([SearchField::Tags, SearchField::Title]));
        assert!(plan.joins_tags);
        assert!(plan.sql.contains("SELECT DISTINCT"));
        assert!(plan.sql.contains("LEFT JOIN tags t"));
        assert!(plan.sql.contains("t.name LIKE ? ESCAPE '\\' OR n.title LIKE ?"));
    }

    #[test]
    fn empty_text_skips_predicate_and_join() {
        let query = NoteQuery::text("")
            .in_fields([SearchField::Tags])
            .in_folder("home");
        let plan = build_note_query(&query);
        assert!(!plan.joins_tags);
        assert!(!plan.sql.contains("LIKE"));
        assert_eq!(plan.binds, vec![Value::Text("home".to_string())]);
    }

    #[test]
    fn whitespace_text_is_matched_verbatim() {
        let plan = build_note_query(&NoteQuery::text(" "));
        assert!(plan.sql.contains("LIKE"));
        assert_eq!(plan.binds, vec![Value::Text("% %".to_string()); 2]);

        let plan = build_note_query(&NoteQuery::text("milk "));
        assert_eq!(plan.binds, vec![Value::Text("%milk %".to_string()); 2]);
    }

    #[test]
    fn listing_ignores_text() {
        let query = NoteQuery::text("milk").with_priority(Priority::High);
        let plan = build_note_listing(&query);
        assert!(!plan.sql.contains("LIKE"));
        assert!(plan.sql.contains("n.priority = ?"));
        assert_eq!(plan.binds, vec![Value::Text("high".to_string())]);
    }

    #[test]
    fn offset_without_limit_is_not_emitted() {
        let plan = build_note_query(&NoteQuery::default().paged(None, 5));
        assert!(!plan.sql.contains("OFFSET"));
        assert!(!plan.sql.contains("LIMIT"));

        let plan = build_note_query(&NoteQuery::default().paged(Some(3), 3));
        assert!(plan.sql.ends_with("LIMIT ? OFFSET ?"));
        assert_eq!(plan.binds, vec![Value::Integer(3), Value::Integer(3)]);
    }

    #[test]
    fn due_date_sort_puts_missing_dates_last() {
        let plan = build_note_query(
            &NoteQuery::default().sorted_by(SortField::DueDate, SortOrder::Asc),
        );
        assert!(plan
            .sql
            .contains("ORDER BY (n.due_date IS NULL) ASC, n.due_date ASC, n.id ASC"));
    }

    #[test]
    fn default_sort_is_updated_at_desc() {
        let plan = build_note_query(&NoteQuery::default());
        assert!(plan.sql.contains("ORDER BY n.updated_at DESC, n.id DESC"));
    }

    #[test]
    fn duplicate_fields_collapse() {
        let query = NoteQuery::text("x").in_fields([SearchField::Content, SearchField::Content]);
        assert_eq!(query.effective_fields(), vec![SearchField::Content]);
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn enum_values_parse_from_boundary_strings() {
        assert_eq!("dueDate".parse::<SortField>().unwrap(), SortField::DueDate);
        assert_eq!("created_at".parse::<SortField>().unwrap(), SortField::CreatedAt);
        assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("Tags".parse::<SearchField>().unwrap(), SearchField::Tags);
        assert!("body".parse::<SearchField>().is_err());
    }
}
