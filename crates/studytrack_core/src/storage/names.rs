//! Filename sanitization and storage-name generation.
//!
//! # Responsibility
//! - Strip path components and unsafe characters from user-supplied names.
//! - Generate random, extension-preserving storage names.
//! - Map extensions to MIME types and MIME types to display helpers.
//!
//! # Invariants
//! - Sanitized names contain only `[A-Za-z0-9._-]` and never start with a
//!   dot.
//! - Storage names are unrelated to the original name.

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

static UNSAFE_CHAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid unsafe-char regex"));
static UNDERSCORE_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_{2,}").expect("valid underscore-run regex"));

/// Sanitizes a declared filename for metadata storage.
///
/// Path components are dropped, unsafe characters become underscores and
/// leading dots are stripped. Returns `None` when nothing usable remains.
pub fn sanitize_filename(declared: &str) -> Option<String> {
    let last_component = declared
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(declared)
        .trim();

    let replaced = UNSAFE_CHAR_RE.replace_all(last_component, "_");
    let collapsed = UNDERSCORE_RUN_RE.replace_all(&replaced, "_");
    let cleaned = collapsed.trim_matches('_').trim_start_matches('.');

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Returns the lowercased extension of `filename`, if any.
pub fn extension_of(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

/// Generates a random storage name preserving the original extension.
///
/// UUID v4 comes from the OS RNG, so names are unguessable and collisions
/// are not a practical concern.
pub fn generate_storage_name(original_filename: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    match extension_of(original_filename) {
        Some(ext) => format!("{token}.{ext}"),
        None => token,
    }
}

/// Derives the thumbnail sibling name for one storage name.
pub fn thumbnail_name(storage_name: &str) -> String {
    match storage_name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_thumb.{ext}"),
        None => format!("{storage_name}_thumb"),
    }
}

/// Returns the MIME type implied by the extension, with a binary fallback.
pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension {
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "zip" => "application/zip",
        "rar" => "application/vnd.rar",
        "py" => "text/x-python",
        "js" => "text/javascript",
        "html" => "text/html",
        "css" => "text/css",
        _ => "application/octet-stream",
    }
}

/// Formats a byte count for display, one decimal place per unit step.
pub fn format_file_size(size_bytes: u64) -> String {
    if size_bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = size_bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} TB")
}

/// Maps one MIME type to the icon name host layers render.
pub fn file_icon(mime: &str) -> &'static str {
    if mime.starts_with("image/") {
        "image"
    } else if mime.starts_with("video/") {
        "video"
    } else if mime.starts_with("audio/") {
        "music"
    } else if mime.contains("pdf") || mime.contains("document") || mime.contains("word") {
        "file-text"
    } else if mime.contains("spreadsheet") || mime.contains("excel") {
        "grid"
    } else if mime.contains("presentation") || mime.contains("powerpoint") {
        "monitor"
    } else if mime.contains("zip") || mime.contains("rar") {
        "archive"
    } else {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::{
        extension_of, file_icon, format_file_size, generate_storage_name, mime_for_extension,
        sanitize_filename, thumbnail_name,
    };

    #[test]
    fn sanitize_drops_path_components() {
        assert_eq!(
            sanitize_filename("../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(
            sanitize_filename(r"C:\Users\me\report.pdf").as_deref(),
            Some("report.pdf")
        );
    }

    #[test]
    fn sanitize_replaces_unsafe_characters_and_collapses_runs() {
        assert_eq!(
            sanitize_filename("my report (final)!.pdf").as_deref(),
            Some("my_report_final_.pdf")
        );
        assert_eq!(
            sanitize_filename("a   b   c.txt").as_deref(),
            Some("a_b_c.txt")
        );
    }

    #[test]
    fn sanitize_strips_leading_dots_and_rejects_empty_results() {
        assert_eq!(sanitize_filename(".hidden").as_deref(), Some("hidden"));
        assert_eq!(sanitize_filename("///"), None);
        assert_eq!(sanitize_filename("   "), None);
    }

    #[test]
    fn storage_name_preserves_extension_and_differs_from_original() {
        let name = generate_storage_name("report.PDF");
        assert!(name.ends_with(".pdf"));
        assert!(!name.contains("report"));
        assert_ne!(generate_storage_name("a.txt"), generate_storage_name("a.txt"));
    }

    #[test]
    fn extension_is_lowercased_and_optional() {
        assert_eq!(extension_of("a.TXT").as_deref(), Some("txt"));
        assert_eq!(extension_of("Makefile"), None);
        assert_eq!(extension_of("archive."), None);
    }

    #[test]
    fn thumbnail_name_inserts_suffix_before_extension() {
        assert_eq!(thumbnail_name("abc123.png"), "abc123_thumb.png");
        assert_eq!(thumbnail_name("noext"), "noext_thumb");
    }

    #[test]
    fn mime_mapping_covers_allow_list_and_falls_back() {
        assert_eq!(mime_for_extension("pdf"), "application/pdf");
        assert_eq!(mime_for_extension("jpeg"), "image/jpeg");
        assert_eq!(mime_for_extension("exe"), "application/octet-stream");
    }

    #[test]
    fn file_size_formats_human_readable() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512.0 B");
        assert_eq!(format_file_size(2048), "2.0 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn icons_follow_mime_families() {
        assert_eq!(file_icon("image/png"), "image");
        assert_eq!(file_icon("application/pdf"), "file-text");
        assert_eq!(file_icon("application/zip"), "archive");
        assert_eq!(file_icon("application/octet-stream"), "file");
    }
}
