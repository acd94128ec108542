//! Collaboration records linking users to shared projects.
//!
//! # Responsibility
//! - Define the invitation row, its role and status values.
//!
//! # Invariants
//! - At most one row exists per `(project_id, user_id)` pair.
//! - The owner is never represented by a row; ownership is derived from
//!   `Project.user_id`.
//! - `accepted` and `declined` are terminal states.

use crate::model::project::ProjectId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

/// Stable identifier for collaboration rows.
pub type CollaborationId = i64;

/// Stored role label on a collaboration row.
///
/// A stored `Owner` label is a data-modeling artifact kept for wire
/// compatibility; real ownership comes only from `Project.user_id` and a
/// labeled row grants edit capability, never invite rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollaboratorRole {
    Owner,
    Collaborator,
    Viewer,
}

impl CollaboratorRole {
    /// Stable string id used in storage and external payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Collaborator => "collaborator",
            Self::Viewer => "viewer",
        }
    }
}

/// Parses one collaborator role from its stable string value.
pub fn parse_collaborator_role(value: &str) -> Option<CollaboratorRole> {
    match value {
        "owner" => Some(CollaboratorRole::Owner),
        "collaborator" => Some(CollaboratorRole::Collaborator),
        "viewer" => Some(CollaboratorRole::Viewer),
        _ => None,
    }
}

/// Invitation lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollaborationStatus {
    /// Invitation sent, awaiting the invitee's decision.
    Pending,
    /// Accepted by the invitee; grants access per role.
    Accepted,
    /// Declined by the invitee; terminal, blocks re-invites.
    Declined,
}

impl CollaborationStatus {
    /// Stable string id used in storage and external payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }
}

/// Parses one collaboration status from its stable string value.
pub fn parse_collaboration_status(value: &str) -> Option<CollaborationStatus> {
    match value {
        "pending" => Some(CollaborationStatus::Pending),
        "accepted" => Some(CollaborationStatus::Accepted),
        "declined" => Some(CollaborationStatus::Declined),
        _ => None,
    }
}

/// Stored collaboration row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCollaborator {
    pub id: CollaborationId,
    pub project_id: ProjectId,
    /// The invited user.
    pub user_id: UserId,
    pub role: CollaboratorRole,
    pub status: CollaborationStatus,
    /// Epoch ms invitation timestamp.
    pub invited_at: i64,
    /// Epoch ms acceptance timestamp; set only on `accepted` rows.
    pub accepted_at: Option<i64>,
}

/// Read model for collaborator listings.
///
/// The owner appears as a synthetic first entry with role `owner` and
/// status `accepted`; it does not correspond to a stored row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorEntry {
    pub user_id: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub role: CollaboratorRole,
    pub status: CollaborationStatus,
    pub accepted_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::{
        parse_collaboration_status, parse_collaborator_role, CollaborationStatus, CollaboratorRole,
    };

    #[test]
    fn role_round_trips_through_stable_strings() {
        for role in [
            CollaboratorRole::Owner,
            CollaboratorRole::Collaborator,
            CollaboratorRole::Viewer,
        ] {
            assert_eq!(parse_collaborator_role(role.as_str()), Some(role));
        }
        assert_eq!(parse_collaborator_role("admin"), None);
    }

    #[test]
    fn status_round_trips_through_stable_strings() {
        for status in [
            CollaborationStatus::Pending,
            CollaborationStatus::Accepted,
            CollaborationStatus::Declined,
        ] {
            assert_eq!(parse_collaboration_status(status.as_str()), Some(status));
        }
        assert_eq!(parse_collaboration_status("revoked"), None);
    }
}
