//! SQLite FTS5-based search implementation.
//!
//! # Responsibility
//! - Provide keyword search over project titles, task titles and note
//!   content.
//! - Restrict hits to projects the caller owns or shares.
//!
//! # Invariants
//! - Hits never leak content from projects the caller cannot access.
//! - Result ordering is deterministic by rank and entity id.

use crate::db::DbError;
use crate::model::project::ProjectId;
use crate::model::user::UserId;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

/// Search-layer error for query parsing, DB interaction and result decoding.
#[derive(Debug)]
pub enum SearchError {
    /// User-provided query cannot be parsed by FTS5 syntax.
    InvalidQuery {
        query: String,
        message: String,
    },
    Db(DbError),
    InvalidData(String),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQuery { query, message } => {
                write!(f, "invalid full-text query `{query}`: {message}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid search row: {message}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidQuery { .. } => None,
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for SearchError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Kind of record behind one search hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEntity {
    Project,
    Task,
    Note,
}

impl SearchEntity {
    /// Stable string id used in the search index.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Task => "task",
            Self::Note => "note",
        }
    }
}

fn parse_search_entity(value: &str) -> Option<SearchEntity> {
    match value {
        "project" => Some(SearchEntity::Project),
        "task" => Some(SearchEntity::Task),
        "note" => Some(SearchEntity::Note),
        _ => None,
    }
}

/// Search options for full-text query behavior.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// User query text.
    pub text: String,
    /// Optional entity filter.
    pub entity: Option<SearchEntity>,
    /// Maximum number of hits to return.
    pub limit: u32,
    /// Whether to pass text directly as raw FTS5 expression.
    ///
    /// Default is `false` to protect type-as-you-search UX from syntax
    /// errors.
    pub raw_fts_syntax: bool,
}

impl SearchQuery {
    /// Creates a query with default pagination and no entity filter.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            entity: None,
            limit: 20,
            raw_fts_syntax: false,
        }
    }
}

/// Single search hit returned by [`search_accessible`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub entity: SearchEntity,
    pub entity_id: i64,
    pub project_id: ProjectId,
    pub snippet: String,
}

/// Searches content via FTS5, restricted to projects `user_id` owns or has
/// an accepted collaboration on.
///
/// Returns an empty list for blank queries.
pub fn search_accessible(
    conn: &Connection,
    user_id: UserId,
    query: &SearchQuery,
) -> SearchResult<Vec<SearchHit>> {
    let Some(match_expr) = build_match_expression(query)? else {
        return Ok(Vec::new());
    };

    if query.limit == 0 {
        return Ok(Vec::new());
    }

    let mut sql = String::from(
        "SELECT
            entity_type,
            entity_id,
            project_id,
            snippet(search_index, 0, '[', ']', ' ... ', 10) AS snippet
         FROM search_index
         WHERE search_index MATCH ?
           AND project_id IN (
               SELECT id
               FROM projects
               WHERE user_id = ?
               UNION
               SELECT project_id
               FROM project_collaborators
               WHERE user_id = ?
                 AND status = 'accepted'
           )",
    );
    let user_id_text = user_id.to_string();
    let mut bind_values: Vec<Value> = vec![
        Value::Text(match_expr.clone()),
        Value::Text(user_id_text.clone()),
        Value::Text(user_id_text),
    ];

    if let Some(entity) = query.entity {
        sql.push_str(" AND entity_type = ?");
        bind_values.push(Value::Text(entity.as_str().to_string()));
    }

    sql.push_str(" ORDER BY bm25(search_index), entity_id ASC LIMIT ?");
    bind_values.push(Value::Integer(i64::from(query.limit)));

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt
        .query(params_from_iter(bind_values))
        .map_err(|err| map_query_error(err, &match_expr))?;
    let mut hits = Vec::new();

    while let Some(row) = rows
        .next()
        .map_err(|err| map_query_error(err, &match_expr))?
    {
        hits.push(parse_search_hit(row)?);
    }

    Ok(hits)
}

fn parse_search_hit(row: &Row<'_>) -> SearchResult<SearchHit> {
    let entity_text: String = row.get("entity_type")?;
    let entity = parse_search_entity(&entity_text)
        .ok_or_else(|| SearchError::InvalidData(format!("invalid entity `{entity_text}`")))?;

    Ok(SearchHit {
        entity,
        entity_id: row.get("entity_id")?,
        project_id: row.get("project_id")?,
        snippet: row.get("snippet")?,
    })
}

fn build_match_expression(query: &SearchQuery) -> SearchResult<Option<String>> {
    let text = query.text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    if query.raw_fts_syntax {
        return Ok(Some(text.to_string()));
    }

    let terms = text
        .split_whitespace()
        .filter(|term| !term.is_empty())
        .map(escape_fts_term)
        .collect::<Vec<_>>();

    if terms.is_empty() {
        return Ok(None);
    }

    Ok(Some(terms.join(" AND ")))
}

fn escape_fts_term(raw: &str) -> String {
    let escaped = raw.replace('"', "\"\"");
    format!("\"{escaped}\"")
}

fn map_query_error(err: rusqlite::Error, query: &str) -> SearchError {
    if is_match_syntax_error(&err) {
        return SearchError::InvalidQuery {
            query: query.to_string(),
            message: err.to_string(),
        };
    }

    SearchError::Db(DbError::Sqlite(err))
}

fn is_match_syntax_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => {
            let msg = message.to_lowercase();
            (msg.contains("fts5") && msg.contains("syntax"))
                || msg.contains("malformed match expression")
                || msg.contains("unterminated")
        }
        _ => false,
    }
}
