//! Collaboration repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist invitation rows and their lifecycle transitions.
//! - Provide the accepted-collaborator read models used by listings and
//!   the access engine.
//!
//! # Invariants
//! - `(project_id, user_id)` is unique; concurrent duplicate invites lose
//!   with [`RepoError::Duplicate`] instead of silently duplicating.
//! - `accepted_at` is stamped only on the pending → accepted transition.

use crate::model::collab::{
    parse_collaboration_status, parse_collaborator_role, CollaborationId, CollaborationStatus,
    CollaboratorEntry, CollaboratorRole, ProjectCollaborator,
};
use crate::model::project::ProjectId;
use crate::model::user::UserId;
use crate::repo::{map_constraint_violation, parse_user_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const COLLAB_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    user_id,
    role,
    status,
    invited_at,
    accepted_at
FROM project_collaborators";

/// Repository interface for collaboration reads.
pub trait CollaborationRepository {
    fn get_collaboration(&self, id: CollaborationId) -> RepoResult<Option<ProjectCollaborator>>;
    fn find_for_user(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> RepoResult<Option<ProjectCollaborator>>;
    /// Lists accepted collaborators joined with user identity, stored order.
    fn list_accepted_entries(&self, project_id: ProjectId) -> RepoResult<Vec<CollaboratorEntry>>;
}

/// SQLite-backed collaboration repository.
pub struct SqliteCollaborationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCollaborationRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CollaborationRepository for SqliteCollaborationRepository<'_> {
    fn get_collaboration(&self, id: CollaborationId) -> RepoResult<Option<ProjectCollaborator>> {
        get_collaboration(self.conn, id)
    }

    fn find_for_user(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> RepoResult<Option<ProjectCollaborator>> {
        find_collaboration_for_user(self.conn, project_id, user_id)
    }

    fn list_accepted_entries(&self, project_id: ProjectId) -> RepoResult<Vec<CollaboratorEntry>> {
        list_accepted_entries(self.conn, project_id)
    }
}

/// Inserts one `pending` row for the invited user.
///
/// The unique `(project_id, user_id)` constraint decides races between
/// concurrent invites; the loser observes [`RepoError::Duplicate`].
pub fn insert_pending(
    conn: &Connection,
    project_id: ProjectId,
    user_id: UserId,
    role: CollaboratorRole,
) -> RepoResult<ProjectCollaborator> {
    conn.execute(
        "INSERT INTO project_collaborators (project_id, user_id, role, status)
         VALUES (?1, ?2, ?3, 'pending');",
        params![project_id, user_id.to_string(), role.as_str()],
    )
    .map_err(|err| map_constraint_violation(err, "collaboration"))?;

    let id = conn.last_insert_rowid();
    get_collaboration(conn, id)?.ok_or(RepoError::InvalidData(
        "created collaboration not found in read-back".to_string(),
    ))
}

/// Moves one row out of `pending`, stamping `accepted_at` on acceptance.
pub fn set_status(
    conn: &Connection,
    id: CollaborationId,
    status: CollaborationStatus,
) -> RepoResult<()> {
    let changed = match status {
        CollaborationStatus::Accepted => conn.execute(
            "UPDATE project_collaborators
             SET
                status = 'accepted',
                accepted_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [id],
        )?,
        _ => conn.execute(
            "UPDATE project_collaborators
             SET status = ?1
             WHERE id = ?2;",
            params![status.as_str(), id],
        )?,
    };

    if changed == 0 {
        return Err(RepoError::NotFound {
            entity: "collaboration",
            id,
        });
    }

    Ok(())
}

/// Loads one collaboration row by stable id.
pub fn get_collaboration(
    conn: &Connection,
    id: CollaborationId,
) -> RepoResult<Option<ProjectCollaborator>> {
    let mut stmt = conn.prepare(&format!("{COLLAB_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_collab_row(row)?));
    }
    Ok(None)
}

/// Finds the row for `(project_id, user_id)` regardless of status.
pub fn find_collaboration_for_user(
    conn: &Connection,
    project_id: ProjectId,
    user_id: UserId,
) -> RepoResult<Option<ProjectCollaborator>> {
    let mut stmt = conn.prepare(&format!(
        "{COLLAB_SELECT_SQL}
         WHERE project_id = ?1
           AND user_id = ?2;"
    ))?;
    let mut rows = stmt.query(params![project_id, user_id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_collab_row(row)?));
    }
    Ok(None)
}

/// Finds the accepted role for `(project_id, user_id)`, if any.
pub fn find_accepted_role(
    conn: &Connection,
    project_id: ProjectId,
    user_id: UserId,
) -> RepoResult<Option<CollaboratorRole>> {
    let found = find_collaboration_for_user(conn, project_id, user_id)?;
    Ok(found
        .filter(|collab| collab.status == CollaborationStatus::Accepted)
        .map(|collab| collab.role))
}

/// Lists accepted collaborators joined with user identity, stored order.
pub fn list_accepted_entries(
    conn: &Connection,
    project_id: ProjectId,
) -> RepoResult<Vec<CollaboratorEntry>> {
    let mut stmt = conn.prepare(
        "SELECT
            pc.user_id,
            u.email,
            u.display_name,
            pc.role,
            pc.status,
            pc.accepted_at
         FROM project_collaborators pc
         INNER JOIN users u ON u.id = pc.user_id
         WHERE pc.project_id = ?1
           AND pc.status = 'accepted'
         ORDER BY pc.id ASC;",
    )?;
    let mut rows = stmt.query([project_id])?;
    let mut entries = Vec::new();
    while let Some(row) = rows.next()? {
        entries.push(parse_entry_row(row)?);
    }
    Ok(entries)
}

fn parse_collab_row(row: &Row<'_>) -> RepoResult<ProjectCollaborator> {
    let user_id_text: String = row.get("user_id")?;
    let user_id = parse_user_uuid(&user_id_text, "project_collaborators.user_id")?;

    let role_text: String = row.get("role")?;
    let role = parse_collaborator_role(&role_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid role `{role_text}` in project_collaborators.role"
        ))
    })?;

    let status_text: String = row.get("status")?;
    let status = parse_collaboration_status(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in project_collaborators.status"
        ))
    })?;

    Ok(ProjectCollaborator {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        user_id,
        role,
        status,
        invited_at: row.get("invited_at")?,
        accepted_at: row.get("accepted_at")?,
    })
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<CollaboratorEntry> {
    let user_id_text: String = row.get("user_id")?;
    let user_id = parse_user_uuid(&user_id_text, "project_collaborators.user_id")?;

    let role_text: String = row.get("role")?;
    let role = parse_collaborator_role(&role_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid role `{role_text}` in project_collaborators.role"
        ))
    })?;

    let status_text: String = row.get("status")?;
    let status = parse_collaboration_status(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in project_collaborators.status"
        ))
    })?;

    Ok(CollaboratorEntry {
        user_id,
        email: row.get("email")?,
        display_name: row.get("display_name")?,
        role,
        status,
        accepted_at: row.get("accepted_at")?,
    })
}
