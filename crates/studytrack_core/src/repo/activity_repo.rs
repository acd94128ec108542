//! Activity log repository: append-only writes, bounded recent-first reads.
//!
//! # Responsibility
//! - Append immutable audit entries, usable inside callers' transactions.
//! - List recent entries with an optional project filter.
//!
//! # Invariants
//! - No update or delete path exists for activity rows.
//! - Listing limit defaults to 20 and clamps to 100.

use crate::model::activity::{ActivityEntry, ActivityId, NewActivity};
use crate::model::project::ProjectId;
use crate::repo::{parse_user_uuid, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const ACTIVITY_DEFAULT_LIMIT: u32 = 20;
const ACTIVITY_LIMIT_MAX: u32 = 100;

/// Query options for recent-activity listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityQuery {
    /// Optional project filter.
    pub project_id: Option<ProjectId>,
    /// Maximum rows to return. Defaults to 20 and clamps to 100.
    pub limit: Option<u32>,
}

/// Repository interface for activity log reads.
pub trait ActivityRepository {
    fn list_recent(&self, query: &ActivityQuery) -> RepoResult<Vec<ActivityEntry>>;
}

/// SQLite-backed activity repository.
pub struct SqliteActivityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteActivityRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ActivityRepository for SqliteActivityRepository<'_> {
    fn list_recent(&self, query: &ActivityQuery) -> RepoResult<Vec<ActivityEntry>> {
        list_recent(self.conn, query)
    }
}

/// Appends one immutable entry and returns its id.
///
/// Callable with a [`rusqlite::Transaction`] so the append shares the
/// primary mutation's commit/rollback boundary.
pub fn append(conn: &Connection, activity: &NewActivity<'_>) -> RepoResult<ActivityId> {
    conn.execute(
        "INSERT INTO activity_logs (user_id, action, entity_type, entity_id, description, project_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            activity.user_id.to_string(),
            activity.action,
            activity.entity_type,
            activity.entity_id,
            activity.description,
            activity.project_id,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Lists entries most-recent-first with optional project filter.
pub fn list_recent(conn: &Connection, query: &ActivityQuery) -> RepoResult<Vec<ActivityEntry>> {
    let mut sql = String::from(
        "SELECT
            id,
            user_id,
            action,
            entity_type,
            entity_id,
            description,
            project_id,
            created_at
         FROM activity_logs
         WHERE 1 = 1",
    );
    let mut bind_values: Vec<Value> = Vec::new();

    if let Some(project_id) = query.project_id {
        sql.push_str(" AND project_id = ?");
        bind_values.push(Value::Integer(project_id));
    }

    sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ?");
    bind_values.push(Value::Integer(i64::from(normalize_activity_limit(
        query.limit,
    ))));

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut entries = Vec::new();
    while let Some(row) = rows.next()? {
        entries.push(parse_activity_row(row)?);
    }
    Ok(entries)
}

/// Normalizes the listing limit according to the activity contract.
pub fn normalize_activity_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) => ACTIVITY_DEFAULT_LIMIT,
        Some(value) if value > ACTIVITY_LIMIT_MAX => ACTIVITY_LIMIT_MAX,
        Some(value) => value,
        None => ACTIVITY_DEFAULT_LIMIT,
    }
}

fn parse_activity_row(row: &Row<'_>) -> RepoResult<ActivityEntry> {
    let user_id_text: String = row.get("user_id")?;
    let user_id = parse_user_uuid(&user_id_text, "activity_logs.user_id")?;

    Ok(ActivityEntry {
        id: row.get("id")?,
        user_id,
        action: row.get("action")?,
        entity_type: row.get("entity_type")?,
        entity_id: row.get("entity_id")?,
        description: row.get("description")?,
        project_id: row.get("project_id")?,
        created_at: row.get("created_at")?,
    })
}
