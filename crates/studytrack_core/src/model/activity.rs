//! Activity log entry model.
//!
//! # Invariants
//! - Entries are append-only; nothing in core updates or deletes them.
//! - `project_id` survives project deletion as `None` so audit history is
//!   never lost.

use crate::model::project::ProjectId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

/// Stable identifier for activity entries.
pub type ActivityId = i64;

/// Immutable audit record for one mutating action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: ActivityId,
    /// Acting user.
    pub user_id: UserId,
    /// Action verb, e.g. `created`, `invited`, `uploaded`.
    pub action: String,
    /// Entity kind the action targeted, e.g. `project`, `task`, `file`.
    pub entity_type: String,
    pub entity_id: i64,
    pub description: Option<String>,
    /// Associated project, if any; cleared when the project is deleted.
    pub project_id: Option<ProjectId>,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}

/// Write model for appending one activity entry.
#[derive(Debug, Clone, Copy)]
pub struct NewActivity<'a> {
    pub user_id: UserId,
    pub action: &'a str,
    pub entity_type: &'a str,
    pub entity_id: i64,
    pub description: Option<&'a str>,
    pub project_id: Option<ProjectId>,
}
