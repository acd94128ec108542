//! Owned-content repository: tasks, notes, study sessions, courses.
//!
//! # Responsibility
//! - Provide persistence for the simple records hanging off projects and
//!   users; no access logic lives here.
//!
//! # Invariants
//! - Note listings are newest-first.
//! - Study durations are positive (also enforced by a CHECK constraint).

use crate::model::content::{
    parse_task_priority, parse_task_status, Course, CourseId, NoteId, ProjectNote, StudySession,
    Task, TaskId, TaskPriority, TaskStatus,
};
use crate::model::project::ProjectId;
use crate::model::user::UserId;
use crate::repo::{parse_user_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    title,
    description,
    status,
    priority,
    due_date,
    created_at,
    updated_at
FROM tasks";

const SESSION_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    user_id,
    duration_minutes,
    description,
    created_at
FROM study_sessions";

/// Write model for creating one task.
#[derive(Debug, Clone)]
pub struct NewTask<'a> {
    pub project_id: ProjectId,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub priority: TaskPriority,
    pub due_date: Option<i64>,
}

/// Write model for creating one course.
#[derive(Debug, Clone)]
pub struct NewCourse<'a> {
    pub name: &'a str,
    pub code: Option<&'a str>,
    pub semester: Option<&'a str>,
    pub year: Option<i64>,
    pub instructor: Option<&'a str>,
    pub credits: Option<i64>,
}

/// Repository interface for project-owned and user-owned content records.
pub trait ContentRepository {
    fn create_task(&self, new_task: &NewTask<'_>) -> RepoResult<Task>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn update_task_status(&self, id: TaskId, status: TaskStatus) -> RepoResult<()>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
    fn list_tasks(&self, project_id: ProjectId) -> RepoResult<Vec<Task>>;

    fn add_note(&self, project_id: ProjectId, content: &str) -> RepoResult<ProjectNote>;
    fn get_note(&self, id: NoteId) -> RepoResult<Option<ProjectNote>>;
    fn delete_note(&self, id: NoteId) -> RepoResult<()>;
    fn list_notes(&self, project_id: ProjectId) -> RepoResult<Vec<ProjectNote>>;

    fn log_session(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        duration_minutes: i64,
        description: Option<&str>,
    ) -> RepoResult<StudySession>;
    fn list_recent_sessions(&self, user_id: UserId, limit: u32) -> RepoResult<Vec<StudySession>>;
    /// Total minutes logged by `user_id`, optionally bounded to entries at
    /// or after `since_epoch_ms`.
    fn total_study_minutes(&self, user_id: UserId, since_epoch_ms: Option<i64>) -> RepoResult<i64>;
    /// Per-project minute totals for `user_id`, optionally time-bounded.
    fn minutes_by_project(
        &self,
        user_id: UserId,
        since_epoch_ms: Option<i64>,
    ) -> RepoResult<Vec<(ProjectId, i64)>>;

    fn add_course(&self, user_id: UserId, new_course: &NewCourse<'_>) -> RepoResult<Course>;
    fn list_courses(&self, user_id: UserId) -> RepoResult<Vec<Course>>;
}

/// SQLite-backed content repository.
pub struct SqliteContentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ContentRepository for SqliteContentRepository<'_> {
    fn create_task(&self, new_task: &NewTask<'_>) -> RepoResult<Task> {
        insert_task(self.conn, new_task)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        get_task(self.conn, id)
    }

    fn update_task_status(&self, id: TaskId, status: TaskStatus) -> RepoResult<()> {
        update_task_status(self.conn, id, status)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        delete_task(self.conn, id)
    }

    fn list_tasks(&self, project_id: ProjectId) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE project_id = ?1
             ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([project_id])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn add_note(&self, project_id: ProjectId, content: &str) -> RepoResult<ProjectNote> {
        insert_note(self.conn, project_id, content)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<ProjectNote>> {
        get_note(self.conn, id)
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        delete_note(self.conn, id)
    }

    fn list_notes(&self, project_id: ProjectId) -> RepoResult<Vec<ProjectNote>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, content, created_at, updated_at
             FROM project_notes
             WHERE project_id = ?1
             ORDER BY created_at DESC, id DESC;",
        )?;
        let mut rows = stmt.query([project_id])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn log_session(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        duration_minutes: i64,
        description: Option<&str>,
    ) -> RepoResult<StudySession> {
        insert_session(self.conn, project_id, user_id, duration_minutes, description)
    }

    fn list_recent_sessions(&self, user_id: UserId, limit: u32) -> RepoResult<Vec<StudySession>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SESSION_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2;"
        ))?;
        let mut rows = stmt.query(params![user_id.to_string(), i64::from(limit)])?;
        let mut sessions = Vec::new();
        while let Some(row) = rows.next()? {
            sessions.push(parse_session_row(row)?);
        }
        Ok(sessions)
    }

    fn total_study_minutes(&self, user_id: UserId, since_epoch_ms: Option<i64>) -> RepoResult<i64> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(duration_minutes), 0)
             FROM study_sessions
             WHERE user_id = ?1
               AND (?2 IS NULL OR created_at >= ?2);",
            params![user_id.to_string(), since_epoch_ms],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    fn minutes_by_project(
        &self,
        user_id: UserId,
        since_epoch_ms: Option<i64>,
    ) -> RepoResult<Vec<(ProjectId, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT project_id, SUM(duration_minutes) AS minutes
             FROM study_sessions
             WHERE user_id = ?1
               AND (?2 IS NULL OR created_at >= ?2)
             GROUP BY project_id
             ORDER BY minutes DESC, project_id ASC;",
        )?;
        let mut rows = stmt.query(params![user_id.to_string(), since_epoch_ms])?;
        let mut totals = Vec::new();
        while let Some(row) = rows.next()? {
            totals.push((row.get(0)?, row.get(1)?));
        }
        Ok(totals)
    }

    fn add_course(&self, user_id: UserId, new_course: &NewCourse<'_>) -> RepoResult<Course> {
        self.conn.execute(
            "INSERT INTO courses (user_id, name, code, semester, year, instructor, credits)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                user_id.to_string(),
                new_course.name,
                new_course.code,
                new_course.semester,
                new_course.year,
                new_course.instructor,
                new_course.credits,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        get_course(self.conn, id)?.ok_or(RepoError::InvalidData(
            "created course not found in read-back".to_string(),
        ))
    }

    fn list_courses(&self, user_id: UserId) -> RepoResult<Vec<Course>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, code, semester, year, instructor, credits, created_at
             FROM courses
             WHERE user_id = ?1
             ORDER BY year DESC, semester ASC, id ASC;",
        )?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut courses = Vec::new();
        while let Some(row) = rows.next()? {
            courses.push(parse_course_row(row)?);
        }
        Ok(courses)
    }
}

/// Inserts one task and returns the stored row.
pub fn insert_task(conn: &Connection, new_task: &NewTask<'_>) -> RepoResult<Task> {
    conn.execute(
        "INSERT INTO tasks (project_id, title, description, priority, due_date)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            new_task.project_id,
            new_task.title,
            new_task.description,
            new_task.priority.as_str(),
            new_task.due_date,
        ],
    )?;

    let id = conn.last_insert_rowid();
    get_task(conn, id)?.ok_or(RepoError::InvalidData(
        "created task not found in read-back".to_string(),
    ))
}

/// Loads one task by stable id.
pub fn get_task(conn: &Connection, id: TaskId) -> RepoResult<Option<Task>> {
    let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_task_row(row)?));
    }
    Ok(None)
}

/// Deletes one task.
pub fn delete_task(conn: &Connection, id: TaskId) -> RepoResult<()> {
    let changed = conn.execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
    if changed == 0 {
        return Err(RepoError::NotFound { entity: "task", id });
    }
    Ok(())
}

/// Deletes one note.
pub fn delete_note(conn: &Connection, id: NoteId) -> RepoResult<()> {
    let changed = conn.execute("DELETE FROM project_notes WHERE id = ?1;", [id])?;
    if changed == 0 {
        return Err(RepoError::NotFound { entity: "note", id });
    }
    Ok(())
}

/// Updates one task's lifecycle status.
pub fn update_task_status(conn: &Connection, id: TaskId, status: TaskStatus) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE tasks
         SET
            status = ?1,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?2;",
        params![status.as_str(), id],
    )?;

    if changed == 0 {
        return Err(RepoError::NotFound { entity: "task", id });
    }

    Ok(())
}

/// Inserts one note and returns the stored row.
pub fn insert_note(conn: &Connection, project_id: ProjectId, content: &str) -> RepoResult<ProjectNote> {
    conn.execute(
        "INSERT INTO project_notes (project_id, content) VALUES (?1, ?2);",
        params![project_id, content],
    )?;

    let id = conn.last_insert_rowid();
    get_note(conn, id)?.ok_or(RepoError::InvalidData(
        "created note not found in read-back".to_string(),
    ))
}

/// Loads one note by stable id.
pub fn get_note(conn: &Connection, id: NoteId) -> RepoResult<Option<ProjectNote>> {
    let mut stmt = conn.prepare(
        "SELECT id, project_id, content, created_at, updated_at
         FROM project_notes
         WHERE id = ?1;",
    )?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_note_row(row)?));
    }
    Ok(None)
}

/// Inserts one study session and returns the stored row.
pub fn insert_session(
    conn: &Connection,
    project_id: ProjectId,
    user_id: UserId,
    duration_minutes: i64,
    description: Option<&str>,
) -> RepoResult<StudySession> {
    conn.execute(
        "INSERT INTO study_sessions (project_id, user_id, duration_minutes, description)
         VALUES (?1, ?2, ?3, ?4);",
        params![
            project_id,
            user_id.to_string(),
            duration_minutes,
            description,
        ],
    )?;

    let id = conn.last_insert_rowid();
    let mut stmt = conn.prepare(&format!("{SESSION_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return parse_session_row(row);
    }
    Err(RepoError::InvalidData(
        "created study session not found in read-back".to_string(),
    ))
}

fn get_course(conn: &Connection, id: CourseId) -> RepoResult<Option<Course>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, code, semester, year, instructor, credits, created_at
         FROM courses
         WHERE id = ?1;",
    )?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_course_row(row)?));
    }
    Ok(None)
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let status_text: String = row.get("status")?;
    let status = parse_task_status(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid task status `{status_text}` in tasks.status"))
    })?;

    let priority_text: String = row.get("priority")?;
    let priority = parse_task_priority(&priority_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid task priority `{priority_text}` in tasks.priority"
        ))
    })?;

    Ok(Task {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status,
        priority,
        due_date: row.get("due_date")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<ProjectNote> {
    Ok(ProjectNote {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_session_row(row: &Row<'_>) -> RepoResult<StudySession> {
    let user_id_text: String = row.get("user_id")?;
    let user_id = parse_user_uuid(&user_id_text, "study_sessions.user_id")?;

    Ok(StudySession {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        user_id,
        duration_minutes: row.get("duration_minutes")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_course_row(row: &Row<'_>) -> RepoResult<Course> {
    let user_id_text: String = row.get("user_id")?;
    let user_id = parse_user_uuid(&user_id_text, "courses.user_id")?;

    Ok(Course {
        id: row.get("id")?,
        user_id,
        name: row.get("name")?,
        code: row.get("code")?,
        semester: row.get("semester")?,
        year: row.get("year")?,
        instructor: row.get("instructor")?,
        credits: row.get("credits")?,
        created_at: row.get("created_at")?,
    })
}
