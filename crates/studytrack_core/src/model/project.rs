//! Project domain model.
//!
//! # Responsibility
//! - Define the project record and its status lifecycle values.
//!
//! # Invariants
//! - `user_id` is the sole source of ownership; it is fixed at creation and
//!   never mutated by any core operation.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

/// Stable identifier for projects.
pub type ProjectId = i64;

/// Project progress status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Created but no work logged yet.
    NotStarted,
    /// Work is in progress.
    InProgress,
    /// Paused deliberately.
    OnHold,
    /// Finished.
    Completed,
}

impl ProjectStatus {
    /// Stable string id used in storage and external payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::OnHold => "on_hold",
            Self::Completed => "completed",
        }
    }
}

/// Parses one project status from its stable string value.
pub fn parse_project_status(value: &str) -> Option<ProjectStatus> {
    match value {
        "not_started" => Some(ProjectStatus::NotStarted),
        "in_progress" => Some(ProjectStatus::InProgress),
        "on_hold" => Some(ProjectStatus::OnHold),
        "completed" => Some(ProjectStatus::Completed),
        _ => None,
    }
}

/// Academic project record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Stable project id.
    pub id: ProjectId,
    pub title: String,
    pub description: Option<String>,
    /// Free-form course tag for dashboard grouping.
    pub course: Option<String>,
    pub status: ProjectStatus,
    /// Optional deadline in epoch milliseconds.
    pub deadline: Option<i64>,
    /// Owning user; immutable after creation.
    pub user_id: UserId,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

impl Project {
    /// Returns whether `user_id` owns this project.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Returns whether the deadline has passed without completion.
    pub fn is_overdue(&self, now_epoch_ms: i64) -> bool {
        match self.deadline {
            Some(deadline) => deadline < now_epoch_ms && self.status != ProjectStatus::Completed,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_project_status, Project, ProjectStatus};
    use uuid::Uuid;

    fn project_with(status: ProjectStatus, deadline: Option<i64>) -> Project {
        Project {
            id: 1,
            title: "thesis".to_string(),
            description: None,
            course: None,
            status,
            deadline,
            user_id: Uuid::new_v4(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn status_round_trips_through_stable_strings() {
        for status in [
            ProjectStatus::NotStarted,
            ProjectStatus::InProgress,
            ProjectStatus::OnHold,
            ProjectStatus::Completed,
        ] {
            assert_eq!(parse_project_status(status.as_str()), Some(status));
        }
        assert_eq!(parse_project_status("archived"), None);
    }

    #[test]
    fn overdue_requires_past_deadline_and_incomplete_status() {
        assert!(project_with(ProjectStatus::InProgress, Some(100)).is_overdue(200));
        assert!(!project_with(ProjectStatus::Completed, Some(100)).is_overdue(200));
        assert!(!project_with(ProjectStatus::InProgress, Some(300)).is_overdue(200));
        assert!(!project_with(ProjectStatus::InProgress, None).is_overdue(200));
    }
}
