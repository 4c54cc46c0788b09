//! Tool handlers: untyped JSON arguments in, text responses out.
//!
//! # Responsibility
//! - Validate loosely-typed tool arguments into core request types.
//! - Run each tool against the shared [`NoteStore`].
//! - Render results as JSON text and failures as plain messages.
//!
//! # Invariants
//! - Every call yields a [`ToolResponse`]; no failure escapes as a panic.
//! - Multi-word argument names accept camelCase and snake_case.
//! - Log lines carry the tool name and outcome, never argument values.

use log::{info, warn};
use notebase_core::{
    FolderServiceError, InvalidValue, NewNote, NoteId, NoteKey, NotePatch, NoteQuery,
    NoteServiceError, NoteStore, SearchField, SortField, SortOrder,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Tool names accepted by [`dispatch`].
pub const TOOL_NAMES: [&str; 11] = [
    "create_note",
    "get_note",
    "update_note",
    "delete_note",
    "search_notes",
    "list_notes",
    "add_tags",
    "remove_tags",
    "create_folder",
    "list_folders",
    "list_tags",
];

/// Outcome of one tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub ok: bool,
    /// JSON document on success, error message on failure.
    pub text: String,
}

impl ToolResponse {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            ok: true,
            text: text.into(),
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            ok: false,
            text: text.into(),
        }
    }
}

/// Tool argument validation error.
#[derive(Debug)]
pub enum ArgumentError {
    /// Arguments do not match the tool's shape.
    Malformed(serde_json::Error),
    /// A string argument names no known enum value.
    Invalid(InvalidValue),
    /// `get_note` needs exactly one of `id` or `title`.
    AmbiguousLookup,
}

impl Display for ArgumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(err) => write!(f, "invalid arguments: {err}"),
            Self::Invalid(err) => write!(f, "{err}"),
            Self::AmbiguousLookup => write!(f, "provide exactly one of `id` or `title`"),
        }
    }
}

impl Error for ArgumentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Malformed(err) => Some(err),
            Self::Invalid(err) => Some(err),
            Self::AmbiguousLookup => None,
        }
    }
}

/// Any failure a tool call can report.
#[derive(Debug)]
pub enum ToolError {
    UnknownTool(String),
    Arguments(ArgumentError),
    Notes(NoteServiceError),
    Folders(FolderServiceError),
    Render(serde_json::Error),
}

impl Display for ToolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTool(name) => write!(
                f,
                "unknown tool `{name}`; expected one of {}",
                TOOL_NAMES.join("|")
            ),
            Self::Arguments(err) => write!(f, "{err}"),
            Self::Notes(err) => write!(f, "{err}"),
            Self::Folders(err) => write!(f, "{err}"),
            Self::Render(err) => write!(f, "failed to render response: {err}"),
        }
    }
}

impl Error for ToolError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnknownTool(_) => None,
            Self::Arguments(err) => Some(err),
            Self::Notes(err) => Some(err),
            Self::Folders(err) => Some(err),
            Self::Render(err) => Some(err),
        }
    }
}

impl From<ArgumentError> for ToolError {
    fn from(value: ArgumentError) -> Self {
        Self::Arguments(value)
    }
}

impl From<InvalidValue> for ToolError {
    fn from(value: InvalidValue) -> Self {
        Self::Arguments(ArgumentError::Invalid(value))
    }
}

impl From<NoteServiceError> for ToolError {
    fn from(value: NoteServiceError) -> Self {
        Self::Notes(value)
    }
}

impl From<FolderServiceError> for ToolError {
    fn from(value: FolderServiceError) -> Self {
        Self::Folders(value)
    }
}

impl ToolError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownTool(_) => "unknown_tool",
            Self::Arguments(_) => "invalid_arguments",
            Self::Notes(NoteServiceError::NoteNotFound(_)) => "not_found",
            Self::Notes(NoteServiceError::ConstraintViolation(_))
            | Self::Folders(FolderServiceError::ConstraintViolation(_)) => "constraint_violation",
            Self::Notes(NoteServiceError::InvalidTitle | NoteServiceError::InvalidTag(_))
            | Self::Folders(FolderServiceError::InvalidName) => "invalid_input",
            Self::Notes(_) | Self::Folders(_) => "storage",
            Self::Render(_) => "render",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateNoteArgs {
    title: String,
    #[serde(default)]
    content: String,
    folder: Option<String>,
    priority: Option<String>,
    #[serde(alias = "due_date")]
    due_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GetNoteArgs {
    id: Option<NoteId>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateNoteArgs {
    id: NoteId,
    title: Option<String>,
    content: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    folder: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null")]
    priority: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null", alias = "due_date")]
    due_date: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct NoteIdArgs {
    id: NoteId,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchNotesArgs {
    query: Option<String>,
    #[serde(alias = "search_in")]
    search_in: Option<Vec<String>>,
    folder: Option<String>,
    priority: Option<String>,
    #[serde(alias = "sort_by")]
    sort_by: Option<String>,
    #[serde(alias = "sort_order")]
    sort_order: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TagArgs {
    id: NoteId,
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CreateFolderArgs {
    name: String,
}

/// Runs one tool call and renders its outcome.
pub fn dispatch(store: &NoteStore, tool: &str, arguments: Value) -> ToolResponse {
    let started_at = Instant::now();
    match run_tool(store, tool, arguments) {
        Ok(text) => {
            info!(
                "event=tool_call module=handlers status=ok tool={} duration_ms={}",
                tool_label(tool),
                started_at.elapsed().as_millis()
            );
            ToolResponse::success(text)
        }
        Err(err) => {
            warn!(
                "event=tool_call module=handlers status=error tool={} error_code={}",
                tool_label(tool),
                err.code()
            );
            ToolResponse::failure(err.to_string())
        }
    }
}

fn run_tool(store: &NoteStore, tool: &str, arguments: Value) -> Result<String, ToolError> {
    match tool {
        "create_note" => {
            let args: CreateNoteArgs = parse_args(arguments)?;
            let mut note = NewNote::new(args.title, args.content);
            note.folder = args.folder;
            note.priority = parse_optional(args.priority.as_deref())?;
            note.due_date = args.due_date;
            render(&store.with_notes(|notes| notes.create_note(note))?)
        }
        "get_note" => {
            let args: GetNoteArgs = parse_args(arguments)?;
            let key = match (args.id, args.title) {
                (Some(id), None) => NoteKey::Id(id),
                (None, Some(title)) => NoteKey::Title(title),
                _ => return Err(ArgumentError::AmbiguousLookup.into()),
            };
            render(&store.with_notes(|notes| notes.require_note(&key))?)
        }
        "update_note" => {
            let args: UpdateNoteArgs = parse_args(arguments)?;
            let priority = match args.priority {
                Some(value) => Some(parse_optional(value.as_deref())?),
                None => None,
            };
            let patch = NotePatch {
                title: args.title,
                content: args.content,
                folder: args.folder,
                priority,
                due_date: args.due_date,
            };
            render(&store.with_notes(|notes| notes.update_note(args.id, patch))?)
        }
        "delete_note" => {
            let args: NoteIdArgs = parse_args(arguments)?;
            store.with_notes(|notes| notes.delete_note(args.id))?;
            Ok(format!("Deleted note {}", args.id))
        }
        "search_notes" => {
            let args: SearchNotesArgs = parse_args(arguments)?;
            let query = build_query(args)?;
            render(&store.with_notes(|notes| notes.search_notes(&query))?)
        }
        "list_notes" => {
            let mut args: SearchNotesArgs = parse_args(arguments)?;
            args.query = None;
            args.search_in = None;
            let query = build_query(args)?;
            render(&store.with_notes(|notes| notes.list_notes(&query))?)
        }
        "add_tags" => {
            let args: TagArgs = parse_args(arguments)?;
            render(&store.with_notes(|notes| notes.add_tags(args.id, &args.tags))?)
        }
        "remove_tags" => {
            let args: TagArgs = parse_args(arguments)?;
            render(&store.with_notes(|notes| notes.remove_tags(args.id, &args.tags))?)
        }
        "create_folder" => {
            let args: CreateFolderArgs = parse_args(arguments)?;
            render(&store.with_folders(|folders| folders.create_folder(&args.name))?)
        }
        "list_folders" => render(&store.with_folders(|folders| folders.list_folders())?),
        "list_tags" => render(&store.with_notes(|notes| notes.list_tags())?),
        other => Err(ToolError::UnknownTool(other.to_string())),
    }
}

fn build_query(args: SearchNotesArgs) -> Result<NoteQuery, ToolError> {
    let fields = args
        .search_in
        .unwrap_or_default()
        .iter()
        .map(|field| field.parse::<SearchField>())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NoteQuery {
        text: args.query,
        fields,
        folder: args.folder,
        priority: parse_optional(args.priority.as_deref())?,
        sort: parse_optional::<SortField>(args.sort_by.as_deref())?.unwrap_or_default(),
        order: parse_optional::<SortOrder>(args.sort_order.as_deref())?.unwrap_or_default(),
        limit: args.limit,
        offset: args.offset.unwrap_or(0),
    })
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, ArgumentError> {
    // Tools without required arguments may be called with `null`.
    let arguments = if arguments.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(ArgumentError::Malformed)
}

fn parse_optional<T>(value: Option<&str>) -> Result<Option<T>, InvalidValue>
where
    T: std::str::FromStr<Err = InvalidValue>,
{
    value.map(str::parse::<T>).transpose()
}

fn render<T: Serialize>(value: &T) -> Result<String, ToolError> {
    serde_json::to_string_pretty(value).map_err(ToolError::Render)
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn tool_label(tool: &str) -> &str {
    if TOOL_NAMES.contains(&tool) {
        tool
    } else {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::{build_query, parse_args, SearchNotesArgs, UpdateNoteArgs};
    use notebase_core::{Priority, SearchField, SortField, SortOrder};
    use serde_json::json;

    #[test]
    fn update_args_distinguish_null_from_absent() {
        let args: UpdateNoteArgs =
            parse_args(json!({ "id": 1, "folder": null, "dueDate": "2024-01-01" })).unwrap();
        assert_eq!(args.folder, Some(None));
        assert_eq!(args.priority, None);
        assert_eq!(args.due_date, Some(Some("2024-01-01".to_string())));
    }

    #[test]
    fn search_args_accept_both_spellings() {
        let args: SearchNotesArgs = parse_args(json!({
            "query": "milk",
            "search_in": ["content", "tags"],
            "sortBy": "createdAt",
            "sort_order": "asc",
            "priority": "HIGH",
            "limit": 5
        }))
        .unwrap();
        let query = build_query(args).unwrap();
        assert_eq!(query.fields, vec![SearchField::Content, SearchField::Tags]);
        assert_eq!(query.sort, SortField::CreatedAt);
        assert_eq!(query.order, SortOrder::Asc);
        assert_eq!(query.priority, Some(Priority::High));
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.offset, 0);
    }

    #[test]
    fn null_arguments_read_as_empty_object() {
        let args: SearchNotesArgs = parse_args(serde_json::Value::Null).unwrap();
        let query = build_query(args).unwrap();
        assert_eq!(query, notebase_core::NoteQuery::default());
    }

    #[test]
    fn unknown_enum_value_is_rejected() {
        let args = SearchNotesArgs {
            sort_by: Some("title".to_string()),
            ..SearchNotesArgs::default()
        };
        let err = build_query(args).unwrap_err();
        assert!(err.to_string().contains("sort field"));
    }
}
