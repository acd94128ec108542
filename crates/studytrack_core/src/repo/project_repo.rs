//! Project repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide project CRUD persistence.
//! - Keep the owning `user_id` immutable after creation.
//!
//! # Invariants
//! - `update_project` never touches `user_id`.
//! - Deleting a project cascades to tasks, notes, sessions, collaborators
//!   and file metadata via foreign keys (`foreign_keys=ON` at bootstrap).
//! - Listings are sorted `updated_at DESC, id ASC` for stable paging.

use crate::model::project::{parse_project_status, Project, ProjectId, ProjectStatus};
use crate::model::user::UserId;
use crate::repo::{parse_user_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const PROJECT_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    course,
    status,
    deadline,
    user_id,
    created_at,
    updated_at
FROM projects";

/// Write model for creating one project.
#[derive(Debug, Clone)]
pub struct NewProject<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub course: Option<&'a str>,
    pub deadline: Option<i64>,
    /// Owner, fixed for the project lifetime.
    pub user_id: UserId,
}

/// Write model for updating project fields.
///
/// Ownership is deliberately absent; it cannot be changed.
#[derive(Debug, Clone)]
pub struct ProjectUpdate<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub course: Option<&'a str>,
    pub status: ProjectStatus,
    pub deadline: Option<i64>,
}

/// Repository interface for project CRUD operations.
pub trait ProjectRepository {
    fn create_project(&self, new_project: &NewProject<'_>) -> RepoResult<Project>;
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    fn update_project(&self, id: ProjectId, update: &ProjectUpdate<'_>) -> RepoResult<()>;
    fn delete_project(&self, id: ProjectId) -> RepoResult<()>;
    /// Lists projects owned by `user_id`.
    fn list_owned(&self, user_id: UserId) -> RepoResult<Vec<Project>>;
    /// Lists projects owned by `user_id` plus accepted shares.
    fn list_accessible(&self, user_id: UserId) -> RepoResult<Vec<Project>>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_project(&self, new_project: &NewProject<'_>) -> RepoResult<Project> {
        insert_project(self.conn, new_project)
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        get_project(self.conn, id)
    }

    fn update_project(&self, id: ProjectId, update: &ProjectUpdate<'_>) -> RepoResult<()> {
        update_project(self.conn, id, update)
    }

    fn delete_project(&self, id: ProjectId) -> RepoResult<()> {
        delete_project(self.conn, id)
    }

    fn list_owned(&self, user_id: UserId) -> RepoResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY updated_at DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }

    fn list_accessible(&self, user_id: UserId) -> RepoResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL}
             WHERE user_id = ?1
                OR id IN (
                    SELECT project_id
                    FROM project_collaborators
                    WHERE user_id = ?1
                      AND status = 'accepted'
                )
             ORDER BY updated_at DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }
}

/// Inserts one project and returns the stored row.
pub fn insert_project(conn: &Connection, new_project: &NewProject<'_>) -> RepoResult<Project> {
    conn.execute(
        "INSERT INTO projects (title, description, course, deadline, user_id)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            new_project.title,
            new_project.description,
            new_project.course,
            new_project.deadline,
            new_project.user_id.to_string(),
        ],
    )?;

    let id = conn.last_insert_rowid();
    get_project(conn, id)?.ok_or(RepoError::InvalidData(
        "created project not found in read-back".to_string(),
    ))
}

/// Loads one project by stable id.
pub fn get_project(conn: &Connection, id: ProjectId) -> RepoResult<Option<Project>> {
    let mut stmt = conn.prepare(&format!("{PROJECT_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_project_row(row)?));
    }
    Ok(None)
}

/// Updates mutable project fields.
pub fn update_project(
    conn: &Connection,
    id: ProjectId,
    update: &ProjectUpdate<'_>,
) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE projects
         SET
            title = ?1,
            description = ?2,
            course = ?3,
            status = ?4,
            deadline = ?5,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?6;",
        params![
            update.title,
            update.description,
            update.course,
            update.status.as_str(),
            update.deadline,
            id,
        ],
    )?;

    if changed == 0 {
        return Err(RepoError::NotFound {
            entity: "project",
            id,
        });
    }

    Ok(())
}

/// Deletes one project; children are removed by foreign-key cascade.
pub fn delete_project(conn: &Connection, id: ProjectId) -> RepoResult<()> {
    let changed = conn.execute("DELETE FROM projects WHERE id = ?1;", [id])?;

    if changed == 0 {
        return Err(RepoError::NotFound {
            entity: "project",
            id,
        });
    }

    Ok(())
}

pub(crate) fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let status_text: String = row.get("status")?;
    let status = parse_project_status(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid project status `{status_text}` in projects.status"
        ))
    })?;

    let user_id_text: String = row.get("user_id")?;
    let user_id = parse_user_uuid(&user_id_text, "projects.user_id")?;

    Ok(Project {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        course: row.get("course")?,
        status,
        deadline: row.get("deadline")?,
        user_id,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
