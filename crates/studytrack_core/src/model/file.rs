//! Stored file attachment model.

use crate::model::project::ProjectId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

/// Stable identifier for stored files.
pub type FileId = i64;

/// Metadata row for one stored attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub id: FileId,
    pub project_id: ProjectId,
    /// Server-generated storage name; random and extension-preserving.
    pub filename: String,
    /// User-supplied name after sanitization.
    pub original_filename: String,
    /// Payload size in bytes.
    pub file_size: i64,
    /// Declared or extension-derived MIME type.
    pub file_type: String,
    /// Locator of the stored bytes relative to the gateway root.
    pub file_path: String,
    pub uploaded_by: UserId,
    /// Epoch ms upload timestamp.
    pub uploaded_at: i64,
}
