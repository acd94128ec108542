//! File metadata repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist attachment metadata rows; bytes live behind the storage
//!   gateway.
//!
//! # Invariants
//! - Generated `filename` values are unique across the whole store.

use crate::model::file::{FileId, ProjectFile};
use crate::model::project::ProjectId;
use crate::model::user::UserId;
use crate::repo::{map_constraint_violation, parse_user_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const FILE_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    filename,
    original_filename,
    file_size,
    file_type,
    file_path,
    uploaded_by,
    uploaded_at
FROM project_files";

/// Write model for recording one stored attachment.
#[derive(Debug, Clone)]
pub struct NewProjectFile<'a> {
    pub project_id: ProjectId,
    pub filename: &'a str,
    pub original_filename: &'a str,
    pub file_size: i64,
    pub file_type: &'a str,
    pub file_path: &'a str,
    pub uploaded_by: UserId,
}

/// Repository interface for attachment metadata reads.
pub trait FileRepository {
    fn get_file(&self, id: FileId) -> RepoResult<Option<ProjectFile>>;
    fn list_files(&self, project_id: ProjectId) -> RepoResult<Vec<ProjectFile>>;
}

/// SQLite-backed file metadata repository.
pub struct SqliteFileRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFileRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl FileRepository for SqliteFileRepository<'_> {
    fn get_file(&self, id: FileId) -> RepoResult<Option<ProjectFile>> {
        get_file(self.conn, id)
    }

    fn list_files(&self, project_id: ProjectId) -> RepoResult<Vec<ProjectFile>> {
        let mut stmt = self.conn.prepare(&format!(
            "{FILE_SELECT_SQL}
             WHERE project_id = ?1
             ORDER BY uploaded_at DESC, id DESC;"
        ))?;
        let mut rows = stmt.query([project_id])?;
        let mut files = Vec::new();
        while let Some(row) = rows.next()? {
            files.push(parse_file_row(row)?);
        }
        Ok(files)
    }
}

/// Inserts one metadata row and returns the stored record.
pub fn insert_file(conn: &Connection, new_file: &NewProjectFile<'_>) -> RepoResult<ProjectFile> {
    conn.execute(
        "INSERT INTO project_files (
            project_id,
            filename,
            original_filename,
            file_size,
            file_type,
            file_path,
            uploaded_by
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            new_file.project_id,
            new_file.filename,
            new_file.original_filename,
            new_file.file_size,
            new_file.file_type,
            new_file.file_path,
            new_file.uploaded_by.to_string(),
        ],
    )
    .map_err(|err| map_constraint_violation(err, "project_file"))?;

    let id = conn.last_insert_rowid();
    get_file(conn, id)?.ok_or(RepoError::InvalidData(
        "created file record not found in read-back".to_string(),
    ))
}

/// Loads one metadata row by stable id.
pub fn get_file(conn: &Connection, id: FileId) -> RepoResult<Option<ProjectFile>> {
    let mut stmt = conn.prepare(&format!("{FILE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_file_row(row)?));
    }
    Ok(None)
}

/// Deletes one metadata row.
pub fn delete_file_row(conn: &Connection, id: FileId) -> RepoResult<()> {
    let changed = conn.execute("DELETE FROM project_files WHERE id = ?1;", [id])?;

    if changed == 0 {
        return Err(RepoError::NotFound { entity: "file", id });
    }

    Ok(())
}

fn parse_file_row(row: &Row<'_>) -> RepoResult<ProjectFile> {
    let uploaded_by_text: String = row.get("uploaded_by")?;
    let uploaded_by = parse_user_uuid(&uploaded_by_text, "project_files.uploaded_by")?;

    Ok(ProjectFile {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        filename: row.get("filename")?,
        original_filename: row.get("original_filename")?,
        file_size: row.get("file_size")?,
        file_type: row.get("file_type")?,
        file_path: row.get("file_path")?,
        uploaded_by,
        uploaded_at: row.get("uploaded_at")?,
    })
}
