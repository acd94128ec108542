//! Project content use-case service: tasks, notes, study time, courses.
//!
//! # Responsibility
//! - Gate owned-content operations through the access engine.
//! - Record activity inside each mutation's transaction.
//!
//! # Invariants
//! - Mutations require edit capability; reads require view capability.
//! - Courses and study analytics are scoped to the acting user, not to a
//!   shared project.

use crate::model::activity::NewActivity;
use crate::model::content::{
    Course, NoteId, ProjectNote, StudySession, Task, TaskId, TaskPriority, TaskStatus,
};
use crate::model::project::ProjectId;
use crate::model::user::UserId;
use crate::repo::activity_repo;
use crate::repo::content_repo::{
    delete_note, delete_task, get_note, get_task, insert_note, insert_session, insert_task,
    update_task_status, ContentRepository, NewCourse, NewTask, SqliteContentRepository,
};
use crate::service::access::{require_access, require_edit};
use crate::service::project_service::{normalize_title, ContentError};
use log::info;
use rusqlite::{Connection, TransactionBehavior};

/// Request model for creating one task.
#[derive(Debug, Clone)]
pub struct NewTaskRequest<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub priority: TaskPriority,
    pub due_date: Option<i64>,
}

/// Study analytics envelope for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyOverview {
    /// Total minutes in the requested window.
    pub total_minutes: i64,
    /// Recent sessions, newest first.
    pub recent: Vec<StudySession>,
    /// Per-project minute totals, largest first.
    pub by_project: Vec<(ProjectId, i64)>,
}

/// Content use-case service over a migrated connection.
pub struct ContentService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> ContentService<'conn> {
    /// Creates a service from a migrated connection.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Creates one task with default status `todo`.
    pub fn add_task(
        &mut self,
        project_id: ProjectId,
        actor: UserId,
        request: &NewTaskRequest<'_>,
    ) -> Result<Task, ContentError> {
        let title = normalize_title(request.title)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        require_edit(&tx, project_id, actor)?;
        let task = insert_task(
            &tx,
            &NewTask {
                project_id,
                title,
                description: request.description,
                priority: request.priority,
                due_date: request.due_date,
            },
        )?;
        activity_repo::append(
            &tx,
            &NewActivity {
                user_id: actor,
                action: "created",
                entity_type: "task",
                entity_id: task.id,
                description: Some(&task.title),
                project_id: Some(project_id),
            },
        )?;
        tx.commit()?;

        Ok(task)
    }

    /// Updates one task's lifecycle status.
    pub fn update_task_status(
        &mut self,
        task_id: TaskId,
        actor: UserId,
        status: TaskStatus,
    ) -> Result<Task, ContentError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let task = get_task(&tx, task_id)?.ok_or(ContentError::NotFound {
            entity: "task",
            id: task_id,
        })?;
        require_edit(&tx, task.project_id, actor)?;

        update_task_status(&tx, task_id, status)?;
        activity_repo::append(
            &tx,
            &NewActivity {
                user_id: actor,
                action: "updated",
                entity_type: "task",
                entity_id: task_id,
                description: Some(status.as_str()),
                project_id: Some(task.project_id),
            },
        )?;
        tx.commit()?;

        get_task(self.conn, task_id)?.ok_or(ContentError::NotFound {
            entity: "task",
            id: task_id,
        })
    }

    /// Deletes one task.
    pub fn delete_task(&mut self, task_id: TaskId, actor: UserId) -> Result<(), ContentError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let task = get_task(&tx, task_id)?.ok_or(ContentError::NotFound {
            entity: "task",
            id: task_id,
        })?;
        require_edit(&tx, task.project_id, actor)?;

        delete_task(&tx, task_id)?;
        activity_repo::append(
            &tx,
            &NewActivity {
                user_id: actor,
                action: "deleted",
                entity_type: "task",
                entity_id: task_id,
                description: Some(&task.title),
                project_id: Some(task.project_id),
            },
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Lists one project's tasks for a caller with view capability.
    pub fn list_tasks(
        &self,
        project_id: ProjectId,
        actor: UserId,
    ) -> Result<Vec<Task>, ContentError> {
        require_access(self.conn, project_id, actor)?;
        let repo = SqliteContentRepository::new(self.conn);
        Ok(repo.list_tasks(project_id)?)
    }

    /// Adds one note to a project.
    pub fn add_note(
        &mut self,
        project_id: ProjectId,
        actor: UserId,
        content: &str,
    ) -> Result<ProjectNote, ContentError> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(ContentError::Validation(
                "note content is required".to_string(),
            ));
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        require_edit(&tx, project_id, actor)?;
        let note = insert_note(&tx, project_id, trimmed)?;
        activity_repo::append(
            &tx,
            &NewActivity {
                user_id: actor,
                action: "created",
                entity_type: "note",
                entity_id: note.id,
                description: None,
                project_id: Some(project_id),
            },
        )?;
        tx.commit()?;

        Ok(note)
    }

    /// Deletes one note.
    pub fn delete_note(&mut self, note_id: NoteId, actor: UserId) -> Result<(), ContentError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let note = get_note(&tx, note_id)?.ok_or(ContentError::NotFound {
            entity: "note",
            id: note_id,
        })?;
        require_edit(&tx, note.project_id, actor)?;

        delete_note(&tx, note_id)?;
        activity_repo::append(
            &tx,
            &NewActivity {
                user_id: actor,
                action: "deleted",
                entity_type: "note",
                entity_id: note_id,
                description: None,
                project_id: Some(note.project_id),
            },
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Lists one project's notes newest-first for a caller with view
    /// capability.
    pub fn list_notes(
        &self,
        project_id: ProjectId,
        actor: UserId,
    ) -> Result<Vec<ProjectNote>, ContentError> {
        require_access(self.conn, project_id, actor)?;
        let repo = SqliteContentRepository::new(self.conn);
        Ok(repo.list_notes(project_id)?)
    }

    /// Logs one study session against a project.
    pub fn log_study_session(
        &mut self,
        project_id: ProjectId,
        actor: UserId,
        duration_minutes: i64,
        description: Option<&str>,
    ) -> Result<StudySession, ContentError> {
        if duration_minutes <= 0 {
            return Err(ContentError::Validation(
                "study duration must be positive".to_string(),
            ));
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        require_edit(&tx, project_id, actor)?;
        let session = insert_session(&tx, project_id, actor, duration_minutes, description)?;
        let minutes = format!("{duration_minutes} minutes");
        activity_repo::append(
            &tx,
            &NewActivity {
                user_id: actor,
                action: "logged_study",
                entity_type: "study_session",
                entity_id: session.id,
                description: Some(&minutes),
                project_id: Some(project_id),
            },
        )?;
        tx.commit()?;

        info!(
            "event=study_logged module=content status=ok project_id={project_id} duration_minutes={duration_minutes}"
        );
        Ok(session)
    }

    /// Builds the study analytics view for the acting user.
    ///
    /// `since_epoch_ms` bounds the totals; recent sessions are capped at
    /// `recent_limit`.
    pub fn study_overview(
        &self,
        actor: UserId,
        since_epoch_ms: Option<i64>,
        recent_limit: u32,
    ) -> Result<StudyOverview, ContentError> {
        let repo = SqliteContentRepository::new(self.conn);
        Ok(StudyOverview {
            total_minutes: repo.total_study_minutes(actor, since_epoch_ms)?,
            recent: repo.list_recent_sessions(actor, recent_limit)?,
            by_project: repo.minutes_by_project(actor, since_epoch_ms)?,
        })
    }

    /// Adds one course for the acting user.
    pub fn add_course(
        &mut self,
        actor: UserId,
        new_course: &NewCourse<'_>,
    ) -> Result<Course, ContentError> {
        if new_course.name.trim().is_empty() {
            return Err(ContentError::Validation(
                "course name is required".to_string(),
            ));
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let course = {
            let repo = SqliteContentRepository::new(&tx);
            repo.add_course(actor, new_course)?
        };
        activity_repo::append(
            &tx,
            &NewActivity {
                user_id: actor,
                action: "created",
                entity_type: "course",
                entity_id: course.id,
                description: Some(&course.name),
                project_id: None,
            },
        )?;
        tx.commit()?;

        Ok(course)
    }

    /// Lists the acting user's courses.
    pub fn list_courses(&self, actor: UserId) -> Result<Vec<Course>, ContentError> {
        let repo = SqliteContentRepository::new(self.conn);
        Ok(repo.list_courses(actor)?)
    }
}

/// Percentage of tasks completed, rounded down; 0 for an empty list.
pub fn task_progress_percentage(tasks: &[Task]) -> u32 {
    if tasks.is_empty() {
        return 0;
    }
    let done = tasks
        .iter()
        .filter(|task| task.status == TaskStatus::Done)
        .count();
    ((done * 100) / tasks.len()) as u32
}

#[cfg(test)]
mod tests {
    use super::task_progress_percentage;
    use crate::model::content::{Task, TaskPriority, TaskStatus};

    fn task_with_status(status: TaskStatus) -> Task {
        Task {
            id: 1,
            project_id: 1,
            title: "t".to_string(),
            description: None,
            status,
            priority: TaskPriority::Medium,
            due_date: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn progress_is_zero_for_no_tasks() {
        assert_eq!(task_progress_percentage(&[]), 0);
    }

    #[test]
    fn progress_rounds_down() {
        let tasks = vec![
            task_with_status(TaskStatus::Done),
            task_with_status(TaskStatus::Todo),
            task_with_status(TaskStatus::InProgress),
        ];
        assert_eq!(task_progress_percentage(&tasks), 33);
    }
}
