//! Repository contracts and SQLite implementations.
//!
//! # Responsibility
//! - Keep SQL details inside the core persistence boundary.
//! - Share one error taxonomy across all aggregates.
//!
//! # Invariants
//! - Read paths reject invalid persisted state instead of masking it.
//! - Multi-statement mutations run inside a single transaction.

use crate::db::DbError;
use crate::model::user::UserId;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod activity_repo;
pub mod collab_repo;
pub mod content_repo;
pub mod file_repo;
pub mod project_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Target row does not exist.
    NotFound { entity: &'static str, id: i64 },
    /// No user matches the given id or email.
    UserNotFound(UserId),
    /// Unique-constraint violation for the named entity.
    Duplicate { entity: &'static str },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::Duplicate { entity } => write!(f, "{entity} already exists"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Maps one unique-constraint failure to [`RepoError::Duplicate`], passing
/// every other error through unchanged.
pub(crate) fn map_constraint_violation(err: rusqlite::Error, entity: &'static str) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            RepoError::Duplicate { entity }
        }
        _ => RepoError::Db(DbError::Sqlite(err)),
    }
}

/// Parses one stored user UUID, naming the column on failure.
pub(crate) fn parse_user_uuid(value: &str, column: &str) -> RepoResult<UserId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}
