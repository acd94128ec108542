//! Access control engine for project-scoped operations.
//!
//! # Responsibility
//! - Derive the capability of a (project, user) pair from ownership and
//!   accepted collaboration records.
//! - Gate every project-scoped service operation that is not already
//!   scoped to the owner.
//!
//! # Invariants
//! - Capability is derived once per decision and never stored.
//! - Ownership comes only from `Project.user_id`; a stored `owner` role on
//!   a collaboration row grants edit capability, not invite rights.
//! - Derivation is a pure function over supplied records; only the loading
//!   helpers touch storage.

use crate::model::collab::{CollaborationStatus, CollaboratorEntry, CollaboratorRole};
use crate::model::project::{Project, ProjectId};
use crate::model::user::UserId;
use crate::repo::collab_repo::{find_accepted_role, list_accepted_entries};
use crate::repo::project_repo::get_project;
use crate::repo::user_repo::get_user;
use crate::repo::RepoError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Capability of one user on one project.
///
/// `Owner` is the creating user; `Editor` covers accepted collaborations
/// with an edit-capable role; `Viewer` is read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Owner,
    Editor,
    Viewer,
}

impl Capability {
    /// Returns whether this capability permits mutations.
    pub fn can_edit(self) -> bool {
        matches!(self, Self::Owner | Self::Editor)
    }

    /// Returns whether this capability permits inviting collaborators.
    ///
    /// Only real ownership qualifies; invite rights are not transitive.
    pub fn can_invite(self) -> bool {
        matches!(self, Self::Owner)
    }
}

/// Errors from access decisions.
#[derive(Debug)]
pub enum AccessError {
    /// Target project does not exist.
    ProjectNotFound(ProjectId),
    /// Caller holds no capability sufficient for the requested action.
    NotAuthorized {
        project_id: ProjectId,
        user_id: UserId,
    },
    /// Persistence-layer failure while loading decision inputs.
    Repo(RepoError),
}

impl Display for AccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::NotAuthorized {
                project_id,
                user_id,
            } => write!(f, "user {user_id} is not authorized on project {project_id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AccessError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Derives the capability for `user_id` from supplied records.
///
/// `accepted_role` must be the role of an `accepted` collaboration row for
/// the same (project, user) pair, or `None` when no such row exists.
pub fn capability_for(
    project: &Project,
    user_id: UserId,
    accepted_role: Option<CollaboratorRole>,
) -> Option<Capability> {
    if project.is_owned_by(user_id) {
        return Some(Capability::Owner);
    }

    match accepted_role? {
        CollaboratorRole::Owner | CollaboratorRole::Collaborator => Some(Capability::Editor),
        CollaboratorRole::Viewer => Some(Capability::Viewer),
    }
}

/// Returns whether `user_id` may view the project at all.
pub fn can_access(
    project: &Project,
    user_id: UserId,
    accepted_role: Option<CollaboratorRole>,
) -> bool {
    capability_for(project, user_id, accepted_role).is_some()
}

/// Returns whether `user_id` may mutate project-scoped content.
pub fn can_edit(
    project: &Project,
    user_id: UserId,
    accepted_role: Option<CollaboratorRole>,
) -> bool {
    capability_for(project, user_id, accepted_role).is_some_and(Capability::can_edit)
}

/// Returns whether `user_id` may invite collaborators.
pub fn can_invite(
    project: &Project,
    user_id: UserId,
    accepted_role: Option<CollaboratorRole>,
) -> bool {
    capability_for(project, user_id, accepted_role).is_some_and(Capability::can_invite)
}

/// Loads decision inputs and derives the caller's capability.
///
/// Returns the project alongside the capability so callers avoid a second
/// lookup after the gate.
pub fn load_capability(
    conn: &Connection,
    project_id: ProjectId,
    user_id: UserId,
) -> Result<(Project, Option<Capability>), AccessError> {
    let project =
        get_project(conn, project_id)?.ok_or(AccessError::ProjectNotFound(project_id))?;
    let accepted_role = find_accepted_role(conn, project_id, user_id)?;
    let capability = capability_for(&project, user_id, accepted_role);
    Ok((project, capability))
}

/// Requires view capability; fails with `NotAuthorized` otherwise.
pub fn require_access(
    conn: &Connection,
    project_id: ProjectId,
    user_id: UserId,
) -> Result<(Project, Capability), AccessError> {
    let (project, capability) = load_capability(conn, project_id, user_id)?;
    match capability {
        Some(capability) => Ok((project, capability)),
        None => Err(AccessError::NotAuthorized {
            project_id,
            user_id,
        }),
    }
}

/// Requires edit capability; fails with `NotAuthorized` otherwise.
pub fn require_edit(
    conn: &Connection,
    project_id: ProjectId,
    user_id: UserId,
) -> Result<(Project, Capability), AccessError> {
    let (project, capability) = require_access(conn, project_id, user_id)?;
    if !capability.can_edit() {
        return Err(AccessError::NotAuthorized {
            project_id,
            user_id,
        });
    }
    Ok((project, capability))
}

/// Requires invite capability (ownership); fails with `NotAuthorized`
/// otherwise.
pub fn require_invite(
    conn: &Connection,
    project_id: ProjectId,
    user_id: UserId,
) -> Result<Project, AccessError> {
    let (project, capability) = require_access(conn, project_id, user_id)?;
    if !capability.can_invite() {
        return Err(AccessError::NotAuthorized {
            project_id,
            user_id,
        });
    }
    Ok(project)
}

/// Lists collaborators with the owner first.
///
/// The owner entry is synthetic (role `owner`, status `accepted`, stamped
/// with project creation time); accepted rows follow in stored order.
pub fn list_collaborators(
    conn: &Connection,
    project_id: ProjectId,
) -> Result<Vec<CollaboratorEntry>, AccessError> {
    let project =
        get_project(conn, project_id)?.ok_or(AccessError::ProjectNotFound(project_id))?;
    let owner = get_user(conn, project.user_id)?.ok_or(AccessError::Repo(
        RepoError::UserNotFound(project.user_id),
    ))?;

    let mut entries = vec![CollaboratorEntry {
        user_id: owner.id,
        email: owner.email,
        display_name: owner.display_name,
        role: CollaboratorRole::Owner,
        status: CollaborationStatus::Accepted,
        accepted_at: Some(project.created_at),
    }];
    entries.extend(list_accepted_entries(conn, project_id)?);
    Ok(entries)
}

/// Result type for access decisions.
pub type AccessResult<T> = Result<T, AccessError>;

#[cfg(test)]
mod tests {
    use super::{can_access, can_edit, can_invite, capability_for, Capability};
    use crate::model::project::{Project, ProjectStatus};
    use crate::model::collab::CollaboratorRole;
    use uuid::Uuid;

    fn project_owned_by(owner: Uuid) -> Project {
        Project {
            id: 7,
            title: "lab report".to_string(),
            description: None,
            course: None,
            status: ProjectStatus::InProgress,
            deadline: None,
            user_id: owner,
            created_at: 1_000,
            updated_at: 1_000,
        }
    }

    #[test]
    fn owner_gets_full_capability_regardless_of_rows() {
        let owner = Uuid::new_v4();
        let project = project_owned_by(owner);

        assert_eq!(
            capability_for(&project, owner, None),
            Some(Capability::Owner)
        );
        assert!(can_access(&project, owner, None));
        assert!(can_edit(&project, owner, None));
        assert!(can_invite(&project, owner, None));
    }

    #[test]
    fn accepted_collaborator_and_owner_labels_grant_edit_without_invite() {
        let owner = Uuid::new_v4();
        let guest = Uuid::new_v4();
        let project = project_owned_by(owner);

        for role in [CollaboratorRole::Collaborator, CollaboratorRole::Owner] {
            assert_eq!(
                capability_for(&project, guest, Some(role)),
                Some(Capability::Editor)
            );
            assert!(can_edit(&project, guest, Some(role)));
            assert!(!can_invite(&project, guest, Some(role)));
        }
    }

    #[test]
    fn viewer_role_is_read_only() {
        let owner = Uuid::new_v4();
        let guest = Uuid::new_v4();
        let project = project_owned_by(owner);

        assert_eq!(
            capability_for(&project, guest, Some(CollaboratorRole::Viewer)),
            Some(Capability::Viewer)
        );
        assert!(can_access(&project, guest, Some(CollaboratorRole::Viewer)));
        assert!(!can_edit(&project, guest, Some(CollaboratorRole::Viewer)));
        assert!(!can_invite(&project, guest, Some(CollaboratorRole::Viewer)));
    }

    #[test]
    fn stranger_has_no_capability() {
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let project = project_owned_by(owner);

        assert_eq!(capability_for(&project, stranger, None), None);
        assert!(!can_access(&project, stranger, None));
        assert!(!can_edit(&project, stranger, None));
        assert!(!can_invite(&project, stranger, None));
    }
}
