//! Owned content records: tasks, notes, study sessions, courses.
//!
//! These carry no access-control nuance of their own; they inherit the
//! access decision of the project (or owning user, for courses).

use crate::model::project::ProjectId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

/// Stable identifier for tasks.
pub type TaskId = i64;
/// Stable identifier for project notes.
pub type NoteId = i64;
/// Stable identifier for study sessions.
pub type StudySessionId = i64;
/// Stable identifier for courses.
pub type CourseId = i64;

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Stable string id used in storage and external payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }
}

/// Parses one task status from its stable string value.
pub fn parse_task_status(value: &str) -> Option<TaskStatus> {
    match value {
        "todo" => Some(TaskStatus::Todo),
        "in_progress" => Some(TaskStatus::InProgress),
        "done" => Some(TaskStatus::Done),
        _ => None,
    }
}

/// Task priority level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    /// Stable string id used in storage and external payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Parses one task priority from its stable string value.
pub fn parse_task_priority(value: &str) -> Option<TaskPriority> {
    match value {
        "low" => Some(TaskPriority::Low),
        "medium" => Some(TaskPriority::Medium),
        "high" => Some(TaskPriority::High),
        _ => None,
    }
}

/// Actionable task within a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Optional due date in epoch milliseconds.
    pub due_date: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Free-form note attached to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectNote {
    pub id: NoteId,
    pub project_id: ProjectId,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Logged block of study time against a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySession {
    pub id: StudySessionId,
    pub project_id: ProjectId,
    pub user_id: UserId,
    /// Always positive; validated before persistence.
    pub duration_minutes: i64,
    pub description: Option<String>,
    pub created_at: i64,
}

/// Course record owned by one user; no sharing semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub user_id: UserId,
    pub name: String,
    pub code: Option<String>,
    pub semester: Option<String>,
    pub year: Option<i64>,
    pub instructor: Option<String>,
    pub credits: Option<i64>,
    pub created_at: i64,
}
