//! File storage gateway over the local filesystem.
//!
//! # Responsibility
//! - Store, retrieve and delete attachment bytes plus their metadata rows.
//! - Derive best-effort thumbnails for image uploads.
//!
//! # Invariants
//! - Bytes land under `project_<id>/` inside the gateway root; metadata
//!   stores the root-relative locator.
//! - Metadata insert and activity entry commit in one transaction; bytes
//!   written for a failed transaction are removed best-effort.
//! - Delete is idempotent over missing bytes.

use crate::model::activity::NewActivity;
use crate::model::file::{FileId, ProjectFile};
use crate::model::project::ProjectId;
use crate::model::user::UserId;
use crate::repo::activity_repo;
use crate::repo::file_repo::{delete_file_row, get_file, insert_file, NewProjectFile};
use crate::storage::names::{
    extension_of, generate_storage_name, mime_for_extension, sanitize_filename, thumbnail_name,
};
use crate::storage::{UploadConfig, UploadError};
use log::{info, warn};
use rusqlite::{Connection, TransactionBehavior};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const THUMBNAIL_MAX_DIM: u32 = 200;

/// Upload request handed to [`FileStorageGateway::store`].
#[derive(Debug, Clone, Copy)]
pub struct UploadRequest<'a> {
    pub bytes: &'a [u8],
    /// User-supplied filename; sanitized before storage.
    pub declared_filename: &'a str,
    /// Declared MIME type; falls back to an extension-derived value.
    pub declared_mime: Option<&'a str>,
    pub project_id: ProjectId,
    pub uploader: UserId,
}

/// Filesystem-backed storage gateway.
///
/// Callers must have passed the access engine before invoking any
/// operation here; the gateway validates content, not identity.
pub struct FileStorageGateway<'conn> {
    conn: &'conn mut Connection,
    root: PathBuf,
    config: UploadConfig,
}

impl<'conn> FileStorageGateway<'conn> {
    /// Creates a gateway rooted at `root` with explicit upload rules.
    pub fn new(conn: &'conn mut Connection, root: impl Into<PathBuf>, config: UploadConfig) -> Self {
        Self {
            conn,
            root: root.into(),
            config,
        }
    }

    /// Validates and stores one upload.
    ///
    /// # Contract
    /// - `UnsupportedType` / `TooLarge` / `InvalidFilename` are returned
    ///   before any byte is written.
    /// - The stored name is random and extension-preserving.
    /// - Image uploads get a bounded thumbnail derivative; thumbnail
    ///   failure never fails the upload.
    pub fn store(&mut self, request: &UploadRequest<'_>) -> Result<ProjectFile, UploadError> {
        let sanitized = sanitize_filename(request.declared_filename).ok_or_else(|| {
            UploadError::InvalidFilename(request.declared_filename.to_string())
        })?;
        let extension =
            extension_of(&sanitized).ok_or_else(|| UploadError::UnsupportedType(sanitized.clone()))?;
        if !self.config.is_extension_allowed(&extension) {
            return Err(UploadError::UnsupportedType(extension));
        }

        let size = request.bytes.len() as u64;
        if size > self.config.max_bytes() {
            return Err(UploadError::TooLarge {
                size,
                max: self.config.max_bytes(),
            });
        }

        let storage_name = generate_storage_name(&sanitized);
        let project_dir = self.root.join(format!("project_{}", request.project_id));
        fs::create_dir_all(&project_dir).map_err(|source| UploadError::Storage {
            context: "create project directory",
            source,
        })?;

        let absolute_path = project_dir.join(&storage_name);
        fs::write(&absolute_path, request.bytes).map_err(|source| UploadError::Storage {
            context: "write upload bytes",
            source,
        })?;

        let mime = request
            .declared_mime
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| mime_for_extension(&extension).to_string());

        if mime.starts_with("image/") {
            if let Err(err) = create_thumbnail(&absolute_path, &project_dir, &storage_name) {
                warn!(
                    "event=thumbnail module=storage status=warn error_code=thumbnail_failed file={} error={}",
                    storage_name, err
                );
            }
        }

        let locator = format!("project_{}/{}", request.project_id, storage_name);
        match self.record_upload(request, &storage_name, &sanitized, size, &mime, &locator) {
            Ok(file) => {
                info!(
                    "event=file_store module=storage status=ok project_id={} file_id={} size={}",
                    request.project_id, file.id, size
                );
                Ok(file)
            }
            Err(err) => {
                // The write already happened; do not leave orphaned bytes
                // behind a failed metadata commit.
                let _ = fs::remove_file(&absolute_path);
                let _ = fs::remove_file(project_dir.join(thumbnail_name(&storage_name)));
                Err(err)
            }
        }
    }

    /// Reads back the stored bytes for one file.
    pub fn retrieve(&self, file: &ProjectFile) -> Result<Vec<u8>, UploadError> {
        match fs::read(self.root.join(&file.file_path)) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(UploadError::FileNotFound(file.id)),
            Err(source) => Err(UploadError::Storage {
                context: "read stored bytes",
                source,
            }),
        }
    }

    /// Deletes one file's bytes and metadata.
    ///
    /// Missing bytes are tolerated; the metadata row is removed either
    /// way and the byte-store failure only logged.
    pub fn delete(&mut self, file_id: FileId, actor: UserId) -> Result<(), UploadError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let file = get_file(&tx, file_id)?.ok_or(UploadError::FileNotFound(file_id))?;

        let absolute_path = self.root.join(&file.file_path);
        match fs::remove_file(&absolute_path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                warn!(
                    "event=file_delete module=storage status=warn error_code=byte_removal_failed file_id={} error={}",
                    file_id, err
                );
            }
        }
        if let Some(parent) = absolute_path.parent() {
            let _ = fs::remove_file(parent.join(thumbnail_name(&file.filename)));
        }

        delete_file_row(&tx, file_id)?;
        activity_repo::append(
            &tx,
            &NewActivity {
                user_id: actor,
                action: "deleted",
                entity_type: "file",
                entity_id: file_id,
                description: Some(&file.original_filename),
                project_id: Some(file.project_id),
            },
        )?;
        tx.commit()?;

        info!(
            "event=file_delete module=storage status=ok file_id={file_id}"
        );
        Ok(())
    }

    /// Removes one project's byte directory, best-effort.
    ///
    /// Metadata rows are already gone via foreign-key cascade when the
    /// project row was deleted; this only reclaims disk space.
    pub fn purge_project(&self, project_id: ProjectId) {
        let project_dir = self.root.join(format!("project_{project_id}"));
        match fs::remove_dir_all(&project_dir) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                warn!(
                    "event=project_purge module=storage status=warn project_id={} error={}",
                    project_id, err
                );
            }
        }
    }

    fn record_upload(
        &mut self,
        request: &UploadRequest<'_>,
        storage_name: &str,
        sanitized: &str,
        size: u64,
        mime: &str,
        locator: &str,
    ) -> Result<ProjectFile, UploadError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let file = insert_file(
            &tx,
            &NewProjectFile {
                project_id: request.project_id,
                filename: storage_name,
                original_filename: sanitized,
                file_size: size as i64,
                file_type: mime,
                file_path: locator,
                uploaded_by: request.uploader,
            },
        )?;
        activity_repo::append(
            &tx,
            &NewActivity {
                user_id: request.uploader,
                action: "uploaded",
                entity_type: "file",
                entity_id: file.id,
                description: Some(&file.original_filename),
                project_id: Some(request.project_id),
            },
        )?;
        tx.commit()?;

        Ok(file)
    }
}

fn create_thumbnail(
    source: &Path,
    project_dir: &Path,
    storage_name: &str,
) -> Result<PathBuf, image::ImageError> {
    let img = image::open(source)?;
    let thumbnail = img.thumbnail(THUMBNAIL_MAX_DIM, THUMBNAIL_MAX_DIM);
    let thumbnail_path = project_dir.join(thumbnail_name(storage_name));
    thumbnail.save(&thumbnail_path)?;
    Ok(thumbnail_path)
}
