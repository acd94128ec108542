//! Core domain logic for StudyTrack.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod search;
pub mod service;
pub mod storage;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::activity::{ActivityEntry, ActivityId, NewActivity};
pub use model::collab::{
    CollaborationId, CollaborationStatus, CollaboratorEntry, CollaboratorRole, ProjectCollaborator,
};
pub use model::content::{
    Course, CourseId, NoteId, ProjectNote, StudySession, Task, TaskId, TaskPriority, TaskStatus,
};
pub use model::file::{FileId, ProjectFile};
pub use model::project::{Project, ProjectId, ProjectStatus};
pub use model::user::{User, UserId};
pub use notify::{InvitationNotice, LogMailer, Mailer, MailerError};
pub use repo::activity_repo::{ActivityQuery, ActivityRepository, SqliteActivityRepository};
pub use repo::collab_repo::{CollaborationRepository, SqliteCollaborationRepository};
pub use repo::content_repo::{
    ContentRepository, NewCourse, NewTask, SqliteContentRepository,
};
pub use repo::file_repo::{FileRepository, SqliteFileRepository};
pub use repo::project_repo::{ProjectRepository, SqliteProjectRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use search::fts::{search_accessible, SearchEntity, SearchError, SearchHit, SearchQuery};
pub use service::access::{
    can_access, can_edit, can_invite, capability_for, list_collaborators, require_access,
    require_edit, require_invite, AccessError, AccessResult, Capability,
};
pub use service::collab_service::{CollabError, CollaborationService};
pub use service::content_service::{
    task_progress_percentage, ContentService, NewTaskRequest, StudyOverview,
};
pub use service::project_service::{
    compute_stats, group_by_course, ContentError, CreateProjectRequest, ProjectService,
    ProjectStats, UpdateProjectRequest,
};
pub use storage::{
    FileStorageGateway, UploadConfig, UploadError, UploadRequest, DEFAULT_ALLOWED_EXTENSIONS,
    MAX_UPLOAD_BYTES,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
