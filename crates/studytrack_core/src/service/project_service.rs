//! Project use-case service.
//!
//! # Responsibility
//! - Provide project CRUD entry points gated by the access engine.
//! - Compute the dashboard aggregates the host layer renders.
//!
//! # Invariants
//! - Every mutation and its activity entry commit in one transaction.
//! - Ownership is fixed at creation; update never touches it and deletion
//!   is owner-only.

use crate::model::activity::NewActivity;
use crate::model::project::{Project, ProjectId, ProjectStatus};
use crate::model::user::UserId;
use crate::repo::activity_repo;
use crate::repo::project_repo::{
    delete_project, insert_project, update_project, NewProject, ProjectRepository, ProjectUpdate,
    SqliteProjectRepository,
};
use crate::repo::RepoError;
use crate::service::access::{require_access, require_edit, AccessError, Capability};
use log::info;
use rusqlite::{Connection, TransactionBehavior};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from project- and content-scoped use-cases.
#[derive(Debug)]
pub enum ContentError {
    /// Actor lacks the capability the operation requires.
    NotAuthorized {
        project_id: ProjectId,
        user_id: UserId,
    },
    /// Target row does not exist.
    NotFound { entity: &'static str, id: i64 },
    /// Caller input fails a validation rule.
    Validation(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ContentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthorized {
                project_id,
                user_id,
            } => write!(f, "user {user_id} is not authorized on project {project_id}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Validation(message) => write!(f, "{message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ContentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ContentError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for ContentError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::Db(crate::db::DbError::Sqlite(value)))
    }
}

impl From<AccessError> for ContentError {
    fn from(value: AccessError) -> Self {
        match value {
            AccessError::ProjectNotFound(id) => Self::NotFound {
                entity: "project",
                id,
            },
            AccessError::NotAuthorized {
                project_id,
                user_id,
            } => Self::NotAuthorized {
                project_id,
                user_id,
            },
            AccessError::Repo(err) => Self::Repo(err),
        }
    }
}

/// Request model for creating one project.
#[derive(Debug, Clone)]
pub struct CreateProjectRequest<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub course: Option<&'a str>,
    pub deadline: Option<i64>,
}

/// Request model for updating project fields.
#[derive(Debug, Clone)]
pub struct UpdateProjectRequest<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub course: Option<&'a str>,
    pub status: ProjectStatus,
    pub deadline: Option<i64>,
}

/// Dashboard aggregates over one user's owned projects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectStats {
    pub total: u32,
    pub completed: u32,
    pub in_progress: u32,
    pub overdue: u32,
}

/// Project use-case service over a migrated connection.
pub struct ProjectService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> ProjectService<'conn> {
    /// Creates a service from a migrated connection.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Creates one project owned by `owner`.
    pub fn create_project(
        &mut self,
        owner: UserId,
        request: &CreateProjectRequest<'_>,
    ) -> Result<Project, ContentError> {
        let title = normalize_title(request.title)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let project = insert_project(
            &tx,
            &NewProject {
                title,
                description: request.description,
                course: request.course,
                deadline: request.deadline,
                user_id: owner,
            },
        )?;
        activity_repo::append(
            &tx,
            &NewActivity {
                user_id: owner,
                action: "created",
                entity_type: "project",
                entity_id: project.id,
                description: Some(&project.title),
                project_id: Some(project.id),
            },
        )?;
        tx.commit()?;

        info!(
            "event=project_create module=project status=ok project_id={}",
            project.id
        );
        Ok(project)
    }

    /// Gets one project the actor may view.
    pub fn get_project(
        &self,
        project_id: ProjectId,
        actor: UserId,
    ) -> Result<Project, ContentError> {
        let (project, _) = require_access(self.conn, project_id, actor)?;
        Ok(project)
    }

    /// Updates project fields; requires edit capability.
    pub fn update_project(
        &mut self,
        project_id: ProjectId,
        actor: UserId,
        request: &UpdateProjectRequest<'_>,
    ) -> Result<Project, ContentError> {
        let title = normalize_title(request.title)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        require_edit(&tx, project_id, actor)?;

        update_project(
            &tx,
            project_id,
            &ProjectUpdate {
                title,
                description: request.description,
                course: request.course,
                status: request.status,
                deadline: request.deadline,
            },
        )?;
        activity_repo::append(
            &tx,
            &NewActivity {
                user_id: actor,
                action: "updated",
                entity_type: "project",
                entity_id: project_id,
                description: Some(title),
                project_id: Some(project_id),
            },
        )?;
        tx.commit()?;

        let repo = SqliteProjectRepository::new(self.conn);
        repo.get_project(project_id)?.ok_or(ContentError::NotFound {
            entity: "project",
            id: project_id,
        })
    }

    /// Deletes one project and everything hanging off it.
    ///
    /// Owner-only. Child rows are removed by foreign-key cascade; the
    /// activity entry survives with its project association cleared.
    pub fn delete_project(
        &mut self,
        project_id: ProjectId,
        actor: UserId,
    ) -> Result<(), ContentError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let (project, capability) = require_access(&tx, project_id, actor)?;
        if capability != Capability::Owner {
            return Err(ContentError::NotAuthorized {
                project_id,
                user_id: actor,
            });
        }

        delete_project(&tx, project_id)?;
        activity_repo::append(
            &tx,
            &NewActivity {
                user_id: actor,
                action: "deleted",
                entity_type: "project",
                entity_id: project_id,
                description: Some(&project.title),
                project_id: None,
            },
        )?;
        tx.commit()?;

        info!(
            "event=project_delete module=project status=ok project_id={project_id}"
        );
        Ok(())
    }

    /// Lists projects the actor owns or shares.
    pub fn list_projects(&self, actor: UserId) -> Result<Vec<Project>, ContentError> {
        let repo = SqliteProjectRepository::new(self.conn);
        Ok(repo.list_accessible(actor)?)
    }

    /// Computes dashboard aggregates over the actor's owned projects.
    pub fn dashboard_stats(
        &self,
        actor: UserId,
        now_epoch_ms: i64,
    ) -> Result<ProjectStats, ContentError> {
        let repo = SqliteProjectRepository::new(self.conn);
        let projects = repo.list_owned(actor)?;
        Ok(compute_stats(&projects, now_epoch_ms))
    }
}

/// Computes dashboard aggregates from supplied projects.
pub fn compute_stats(projects: &[Project], now_epoch_ms: i64) -> ProjectStats {
    let mut stats = ProjectStats {
        total: projects.len() as u32,
        ..ProjectStats::default()
    };
    for project in projects {
        match project.status {
            ProjectStatus::Completed => stats.completed += 1,
            ProjectStatus::InProgress => stats.in_progress += 1,
            _ => {}
        }
        if project.is_overdue(now_epoch_ms) {
            stats.overdue += 1;
        }
    }
    stats
}

/// Groups projects by course tag; untagged projects land under
/// `Uncategorized`.
pub fn group_by_course(projects: Vec<Project>) -> BTreeMap<String, Vec<Project>> {
    let mut grouped: BTreeMap<String, Vec<Project>> = BTreeMap::new();
    for project in projects {
        let course = project
            .course
            .clone()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "Uncategorized".to_string());
        grouped.entry(course).or_default().push(project);
    }
    grouped
}

pub(crate) fn normalize_title(title: &str) -> Result<&str, ContentError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ContentError::Validation("title is required".to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::{compute_stats, group_by_course, normalize_title};
    use crate::model::project::{Project, ProjectStatus};
    use uuid::Uuid;

    fn project(status: ProjectStatus, deadline: Option<i64>, course: Option<&str>) -> Project {
        Project {
            id: 1,
            title: "p".to_string(),
            description: None,
            course: course.map(str::to_string),
            status,
            deadline,
            user_id: Uuid::new_v4(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn stats_count_completed_in_progress_and_overdue() {
        let projects = vec![
            project(ProjectStatus::Completed, Some(100), None),
            project(ProjectStatus::InProgress, Some(100), None),
            project(ProjectStatus::NotStarted, None, None),
        ];
        let stats = compute_stats(&projects, 200);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.overdue, 1);
    }

    #[test]
    fn grouping_defaults_blank_course_to_uncategorized() {
        let grouped = group_by_course(vec![
            project(ProjectStatus::NotStarted, None, Some("CS101")),
            project(ProjectStatus::NotStarted, None, Some("  ")),
            project(ProjectStatus::NotStarted, None, None),
        ]);
        assert_eq!(grouped.get("CS101").map(Vec::len), Some(1));
        assert_eq!(grouped.get("Uncategorized").map(Vec::len), Some(2));
    }

    #[test]
    fn blank_title_is_rejected() {
        assert!(normalize_title("   ").is_err());
        assert_eq!(normalize_title(" essay ").unwrap(), "essay");
    }
}
