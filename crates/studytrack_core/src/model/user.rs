//! User identity record.
//!
//! # Responsibility
//! - Define the user shape referenced by every owned record.
//!
//! # Invariants
//! - `id` is stable and never reused for another user.
//! - `email` is unique case-insensitively; lookups normalize before compare.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for registered users.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type UserId = Uuid;

/// Registered user identity.
///
/// Credential verification itself is the host layer's job; core only carries
/// the hash and the verification flag alongside the identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable global ID used for ownership, collaboration and auditing.
    pub id: UserId,
    /// Unique login email, matched case-insensitively.
    pub email: String,
    /// Optional display name for collaborator listings.
    pub display_name: Option<String>,
    /// Password hash supplied by the host identity layer.
    pub password_hash: Option<String>,
    /// Whether the email address has been verified.
    pub is_verified: bool,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}
