//! User repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide user lookup and registration persistence.
//!
//! # Invariants
//! - Email matching is case-insensitive (`COLLATE NOCASE` on the column).
//! - Emails are stored trimmed.

use crate::model::user::{User, UserId};
use crate::repo::{map_constraint_violation, parse_user_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const USER_SELECT_SQL: &str = "SELECT
    id,
    email,
    display_name,
    password_hash,
    is_verified,
    created_at,
    updated_at
FROM users";

/// Repository interface for user identity records.
pub trait UserRepository {
    fn create_user(
        &self,
        email: &str,
        display_name: Option<&str>,
        password_hash: Option<&str>,
    ) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    fn mark_verified(&self, id: UserId) -> RepoResult<()>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(
        &self,
        email: &str,
        display_name: Option<&str>,
        password_hash: Option<&str>,
    ) -> RepoResult<User> {
        let id = Uuid::new_v4();
        self.conn
            .execute(
                "INSERT INTO users (id, email, display_name, password_hash)
                 VALUES (?1, ?2, ?3, ?4);",
                params![id.to_string(), email.trim(), display_name, password_hash],
            )
            .map_err(|err| map_constraint_violation(err, "user"))?;

        get_user(self.conn, id)?.ok_or(RepoError::InvalidData(
            "created user not found in read-back".to_string(),
        ))
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        get_user(self.conn, id)
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        find_user_by_email(self.conn, email)
    }

    fn mark_verified(&self, id: UserId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users
             SET
                is_verified = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::UserNotFound(id));
        }

        Ok(())
    }
}

/// Loads one user by stable id.
pub fn get_user(conn: &Connection, id: UserId) -> RepoResult<Option<User>> {
    let mut stmt = conn.prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_user_row(row)?));
    }
    Ok(None)
}

/// Finds one user by email, matching case-insensitively.
pub fn find_user_by_email(conn: &Connection, email: &str) -> RepoResult<Option<User>> {
    let mut stmt = conn.prepare(&format!("{USER_SELECT_SQL} WHERE email = ?1;"))?;
    let mut rows = stmt.query([email.trim()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_user_row(row)?));
    }
    Ok(None)
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id_text: String = row.get("id")?;
    let id = parse_user_uuid(&id_text, "users.id")?;

    let is_verified = match row.get::<_, i64>("is_verified")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_verified value `{other}` in users.is_verified"
            )));
        }
    };

    Ok(User {
        id,
        email: row.get("email")?,
        display_name: row.get("display_name")?,
        password_hash: row.get("password_hash")?,
        is_verified,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
