//! File storage gateway: validation, byte persistence, thumbnails.
//!
//! # Responsibility
//! - Validate uploads against an explicit immutable configuration.
//! - Persist and retrieve attachment bytes under per-project directories.
//!
//! # Invariants
//! - Validation happens before any byte is written.
//! - The gateway never re-checks identity; callers pass the access engine
//!   first (`can_edit` for store/delete, `can_access` for retrieve).

use crate::model::file::FileId;
use crate::repo::RepoError;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod gateway;
pub mod names;

pub use gateway::{FileStorageGateway, UploadRequest};

/// Upload ceiling: 16 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

/// Extensions accepted for upload: documents, images, archives, code/text.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[
    "txt", "pdf", "png", "jpg", "jpeg", "gif", "doc", "docx", "ppt", "pptx", "xls", "xlsx", "zip",
    "rar", "py", "js", "html", "css",
];

/// Immutable upload validation configuration.
///
/// Passed into the gateway constructor instead of living in ambient state.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    allowed_extensions: BTreeSet<String>,
    max_bytes: u64,
}

impl UploadConfig {
    /// Builds a configuration from explicit values.
    pub fn new<I, S>(allowed_extensions: I, max_bytes: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|ext| ext.as_ref().to_ascii_lowercase())
                .collect(),
            max_bytes,
        }
    }

    /// Returns whether `extension` (lowercased) is accepted.
    pub fn is_extension_allowed(&self, extension: &str) -> bool {
        self.allowed_extensions
            .contains(&extension.to_ascii_lowercase())
    }

    /// Returns the payload ceiling in bytes.
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_EXTENSIONS.iter().copied(), MAX_UPLOAD_BYTES)
    }
}

/// Errors from file storage operations.
#[derive(Debug)]
pub enum UploadError {
    /// Extension is missing or not on the allow-list.
    UnsupportedType(String),
    /// Payload exceeds the configured ceiling.
    TooLarge { size: u64, max: u64 },
    /// Declared filename sanitizes to nothing usable.
    InvalidFilename(String),
    /// Metadata row or stored bytes do not exist.
    FileNotFound(FileId),
    /// Underlying byte store failure.
    Storage {
        context: &'static str,
        source: std::io::Error,
    },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for UploadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedType(name) => write!(f, "unsupported file type: {name}"),
            Self::TooLarge { size, max } => {
                write!(f, "payload of {size} bytes exceeds limit of {max} bytes")
            }
            Self::InvalidFilename(name) => write!(f, "invalid filename: {name}"),
            Self::FileNotFound(id) => write!(f, "file not found: {id}"),
            Self::Storage { context, source } => write!(f, "storage failure during {context}: {source}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UploadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage { source, .. } => Some(source),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for UploadError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for UploadError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::Db(crate::db::DbError::Sqlite(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::{UploadConfig, DEFAULT_ALLOWED_EXTENSIONS, MAX_UPLOAD_BYTES};

    #[test]
    fn default_config_covers_documented_allow_list() {
        let config = UploadConfig::default();
        for ext in DEFAULT_ALLOWED_EXTENSIONS {
            assert!(config.is_extension_allowed(ext), "{ext} should be allowed");
        }
        assert!(!config.is_extension_allowed("exe"));
        assert!(!config.is_extension_allowed("sh"));
        assert_eq!(config.max_bytes(), MAX_UPLOAD_BYTES);
    }

    #[test]
    fn extension_matching_is_case_insensitive() {
        let config = UploadConfig::default();
        assert!(config.is_extension_allowed("PDF"));
        assert!(config.is_extension_allowed("Jpeg"));
    }
}
