//! Namespace path resolution
//!
//! Maps a user identity and a requested filename to a path inside that
//! user's storage directory, rejecting anything that could escape it.

use log::warn;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

use crate::error::StorageError;
use crate::storage::catalog;
use crate::storage::filesystem;

const MAX_USER_ID_LENGTH: usize = 64;

/// Opaque, filesystem-safe identifier of a user namespace.
///
/// Only lowercase ASCII letters, digits, `-` and `_` are accepted, so two
/// distinct ids can never name the same or nested directories, even on a
/// case-insensitive filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_USER_ID_LENGTH
            && raw
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');

        if valid {
            Ok(UserId(raw.to_string()))
        } else {
            Err(StorageError::InvalidUserId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        UserId(id.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reduces a client-supplied name to a plain, visible file name.
///
/// Returns `None` when nothing usable is left.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let ascii: String = raw.nfkd().filter(char::is_ascii).collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn has_drive_prefix(raw: &str) -> bool {
    let mut chars = raw.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(letter), Some(':')) if letter.is_ascii_alphabetic()
    )
}

fn reject(raw: &str, why: &str) -> StorageError {
    warn!("Rejected filename {:?}: {}", raw, why);
    StorageError::InvalidFilename(raw.to_string())
}

/// Directory holding every file of `user_id`
pub fn namespace_dir(storage_root: &Path, user_id: &UserId) -> PathBuf {
    storage_root.join(user_id.as_str())
}

/// Creates the namespace directory if missing; an existing one is success
pub fn ensure_namespace(storage_root: &Path, user_id: &UserId) -> Result<PathBuf, StorageError> {
    let dir = namespace_dir(storage_root, user_id);
    filesystem::create_directory(&dir)?;
    Ok(dir)
}

/// Resolves `raw_filename` to a path directly inside the user's namespace.
///
/// Names carrying path separators, `..`, NUL bytes or absolute prefixes are
/// rejected outright rather than rewritten.
pub fn resolve(
    storage_root: &Path,
    user_id: &UserId,
    raw_filename: &str,
) -> Result<PathBuf, StorageError> {
    if raw_filename.contains(['/', '\\', '\0']) {
        return Err(reject(raw_filename, "path separator or NUL byte"));
    }
    if raw_filename.contains("..") {
        return Err(reject(raw_filename, "parent directory reference"));
    }
    if Path::new(raw_filename).is_absolute() || has_drive_prefix(raw_filename) {
        return Err(reject(raw_filename, "absolute path"));
    }

    let sanitized =
        sanitize_filename(raw_filename).ok_or_else(|| reject(raw_filename, "empty after sanitizing"))?;

    let dir = namespace_dir(storage_root, user_id);
    let path = dir.join(&sanitized);

    if path.parent() != Some(dir.as_path())
        || path.file_name().and_then(|name| name.to_str()) != Some(sanitized.as_str())
    {
        return Err(reject(raw_filename, "resolves outside the namespace"));
    }

    Ok(path)
}

/// A file addressed relative to the project root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPath {
    pub path: PathBuf,
    /// Extension is on the project whitelist (plain text, CSV, JSON)
    pub editable: bool,
}

/// Resolves `raw_path` relative to the fixed project root.
///
/// This bypasses per-user isolation entirely. Callers must gate it behind an
/// elevated identity and honour `editable` before writing.
pub fn resolve_project_relative(
    project_root: &Path,
    raw_path: &str,
) -> Result<ProjectPath, StorageError> {
    if raw_path.is_empty() || raw_path.contains(['\0', '\\']) {
        return Err(reject(raw_path, "empty, NUL byte or backslash"));
    }
    if raw_path.contains("..") {
        return Err(reject(raw_path, "parent directory reference"));
    }

    let relative = Path::new(raw_path);
    if relative.is_absolute() || has_drive_prefix(raw_path) {
        return Err(reject(raw_path, "absolute path"));
    }
    if !relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
    {
        return Err(reject(raw_path, "non-normal path component"));
    }

    let path = project_root.join(relative);
    if !path.starts_with(project_root) {
        return Err(reject(raw_path, "resolves outside the project root"));
    }

    let editable = catalog::lookup_path(&path).is_some_and(|traits| traits.project_editable);

    Ok(ProjectPath { path, editable })
}
