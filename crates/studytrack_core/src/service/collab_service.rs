//! Collaboration lifecycle service.
//!
//! # Responsibility
//! - Drive the invitation state machine: invite → accepted | declined.
//! - Enforce inviter/invitee authorization and duplicate rules.
//! - Record activity inside the mutation's transaction and notify the
//!   mailer after commit.
//!
//! # Invariants
//! - Only the project owner invites; stored role labels never grant invite
//!   rights.
//! - `accepted` and `declined` are terminal; there is no revoke operation
//!   and a declined user cannot be re-invited.
//! - Email matching is case-insensitive.

use crate::model::collab::{
    CollaborationId, CollaborationStatus, CollaboratorRole, ProjectCollaborator,
};
use crate::model::activity::NewActivity;
use crate::model::project::ProjectId;
use crate::model::user::UserId;
use crate::notify::{InvitationNotice, Mailer};
use crate::repo::activity_repo;
use crate::repo::collab_repo::{
    find_collaboration_for_user, get_collaboration, insert_pending, set_status,
};
use crate::repo::user_repo::{find_user_by_email, get_user};
use crate::repo::RepoError;
use crate::service::access::{require_invite, AccessError};
use log::{info, warn};
use rusqlite::{Connection, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Errors from collaboration lifecycle operations.
#[derive(Debug)]
pub enum CollabError {
    /// Actor lacks the capability the operation requires.
    NotAuthorized {
        project_id: ProjectId,
        user_id: UserId,
    },
    /// Target project does not exist.
    ProjectNotFound(ProjectId),
    /// No user matches the invited email.
    UserNotFound(String),
    /// A collaboration row already exists for the pair, or the invitee is
    /// the owner.
    AlreadyCollaborator {
        project_id: ProjectId,
        user_id: UserId,
    },
    /// Target collaboration row does not exist.
    CollaborationNotFound(CollaborationId),
    /// Transition attempted from a non-`pending` state.
    InvalidState {
        id: CollaborationId,
        status: CollaborationStatus,
    },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for CollabError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthorized {
                project_id,
                user_id,
            } => write!(f, "user {user_id} is not authorized on project {project_id}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::UserNotFound(email) => write!(f, "no user matches email: {email}"),
            Self::AlreadyCollaborator {
                project_id,
                user_id,
            } => write!(
                f,
                "user {user_id} already has a collaboration on project {project_id}"
            ),
            Self::CollaborationNotFound(id) => write!(f, "collaboration not found: {id}"),
            Self::InvalidState { id, status } => write!(
                f,
                "collaboration {id} cannot transition from status `{}`",
                status.as_str()
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CollabError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CollabError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for CollabError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::Db(crate::db::DbError::Sqlite(value)))
    }
}

impl From<AccessError> for CollabError {
    fn from(value: AccessError) -> Self {
        match value {
            AccessError::ProjectNotFound(id) => Self::ProjectNotFound(id),
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

/// Collaboration lifecycle service over a migrated connection.
pub struct CollaborationService<'conn> {
    conn: &'conn mut Connection,
    mailer: Arc<dyn Mailer>,
}

impl<'conn> CollaborationService<'conn> {
    /// Creates a service from a migrated connection and a mailer seam.
    pub fn new(conn: &'conn mut Connection, mailer: Arc<dyn Mailer>) -> Self {
        Self { conn, mailer }
    }

    /// Invites `invitee_email` onto the project as `role`.
    ///
    /// # Contract
    /// - Fails with `NotAuthorized` unless `inviter` owns the project.
    /// - Fails with `UserNotFound` when no user matches the email
    ///   (case-insensitive).
    /// - Fails with `AlreadyCollaborator` when a row exists for the pair in
    ///   any status, or when the email resolves to the owner.
    /// - On success the `pending` row and its activity entry commit
    ///   together; the mailer runs after commit and its failure is logged,
    ///   never surfaced.
    pub fn invite(
        &mut self,
        project_id: ProjectId,
        inviter: UserId,
        invitee_email: &str,
        role: CollaboratorRole,
    ) -> Result<ProjectCollaborator, CollabError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let project = require_invite(&tx, project_id, inviter)?;
        let invitee = find_user_by_email(&tx, invitee_email)?
            .ok_or_else(|| CollabError::UserNotFound(invitee_email.trim().to_string()))?;

        // Ownership is not representable as a collaboration row.
        if invitee.id == project.user_id {
            return Err(CollabError::AlreadyCollaborator {
                project_id,
                user_id: invitee.id,
            });
        }

        if find_collaboration_for_user(&tx, project_id, invitee.id)?.is_some() {
            return Err(CollabError::AlreadyCollaborator {
                project_id,
                user_id: invitee.id,
            });
        }

        let collaboration =
            insert_pending(&tx, project_id, invitee.id, role).map_err(|err| match err {
                RepoError::Duplicate { .. } => CollabError::AlreadyCollaborator {
                    project_id,
                    user_id: invitee.id,
                },
                other => CollabError::Repo(other),
            })?;

        let description = format!("invited {} as {}", invitee.email, role.as_str());
        activity_repo::append(
            &tx,
            &NewActivity {
                user_id: inviter,
                action: "invited",
                entity_type: "collaboration",
                entity_id: collaboration.id,
                description: Some(&description),
                project_id: Some(project_id),
            },
        )?;

        let inviter_email = get_user(&tx, inviter)?
            .map(|user| user.email)
            .unwrap_or_default();
        tx.commit()?;

        let notice = InvitationNotice {
            project_title: &project.title,
            inviter_email: &inviter_email,
            invitee_email: &invitee.email,
            role,
        };
        if let Err(err) = self.mailer.send_invitation(&notice) {
            warn!(
                "event=invite module=collab status=warn error_code=notify_failed collaboration_id={} error={}",
                collaboration.id, err
            );
        }

        info!(
            "event=invite module=collab status=ok project_id={} collaboration_id={} role={}",
            project_id,
            collaboration.id,
            role.as_str()
        );
        Ok(collaboration)
    }

    /// Accepts a pending invitation.
    ///
    /// # Contract
    /// - Fails with `NotAuthorized` unless `actor` is the invited user.
    /// - Fails with `InvalidState` unless the row is `pending`.
    /// - Stamps `accepted_at` and records activity in the same transaction.
    pub fn accept(
        &mut self,
        collaboration_id: CollaborationId,
        actor: UserId,
    ) -> Result<ProjectCollaborator, CollabError> {
        self.transition(collaboration_id, actor, CollaborationStatus::Accepted)
    }

    /// Declines a pending invitation. Declined is terminal.
    pub fn decline(
        &mut self,
        collaboration_id: CollaborationId,
        actor: UserId,
    ) -> Result<ProjectCollaborator, CollabError> {
        self.transition(collaboration_id, actor, CollaborationStatus::Declined)
    }

    fn transition(
        &mut self,
        collaboration_id: CollaborationId,
        actor: UserId,
        target: CollaborationStatus,
    ) -> Result<ProjectCollaborator, CollabError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let collaboration = get_collaboration(&tx, collaboration_id)?
            .ok_or(CollabError::CollaborationNotFound(collaboration_id))?;

        if collaboration.user_id != actor {
            return Err(CollabError::NotAuthorized {
                project_id: collaboration.project_id,
                user_id: actor,
            });
        }

        if collaboration.status != CollaborationStatus::Pending {
            return Err(CollabError::InvalidState {
                id: collaboration_id,
                status: collaboration.status,
            });
        }

        set_status(&tx, collaboration_id, target)?;

        let action = match target {
            CollaborationStatus::Accepted => "accepted_invite",
            _ => "declined_invite",
        };
        activity_repo::append(
            &tx,
            &NewActivity {
                user_id: actor,
                action,
                entity_type: "collaboration",
                entity_id: collaboration_id,
                description: None,
                project_id: Some(collaboration.project_id),
            },
        )?;

        tx.commit()?;

        info!(
            "event=collab_transition module=collab status=ok collaboration_id={} target={}",
            collaboration_id,
            target.as_str()
        );

        get_collaboration(self.conn, collaboration_id)?
            .ok_or(CollabError::CollaborationNotFound(collaboration_id))
    }
}
