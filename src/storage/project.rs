//! Project file access
//!
//! Reads and edits whitelisted text files (plain text, CSV, JSON) relative
//! to the project root. This escapes per-user isolation, so it is off unless
//! configured, and the protocol layer only allows elevated identities here.

use log::warn;
use std::fs;
use std::path::PathBuf;

use crate::error::StorageError;
use crate::storage::codec::NOT_DISPLAYABLE;
use crate::storage::filesystem;
use crate::storage::namespace::{ProjectPath, resolve_project_relative};
use crate::storage::results::ContentView;

#[derive(Debug, Clone)]
pub struct ProjectFiles {
    project_root: PathBuf,
}

impl ProjectFiles {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }

    fn existing(&self, raw_path: &str) -> Result<ProjectPath, StorageError> {
        let resolved = resolve_project_relative(&self.project_root, raw_path)?;
        if !filesystem::file_exists(&resolved.path) {
            return Err(StorageError::NotFound(raw_path.to_string()));
        }
        Ok(resolved)
    }

    /// Fails unless `raw_path` resolves to an existing project file
    pub fn ensure_exists(&self, raw_path: &str) -> Result<(), StorageError> {
        self.existing(raw_path).map(|_| ())
    }

    pub fn read_content(&self, raw_path: &str) -> Result<ContentView, StorageError> {
        let ProjectPath { path, editable } = self.existing(raw_path)?;
        if !editable {
            return Ok(ContentView::not_text(NOT_DISPLAYABLE));
        }

        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::InvalidData => StorageError::Decode(raw_path.to_string()),
            _ => StorageError::from_io(raw_path, e),
        })?;
        Ok(ContentView::text(content))
    }

    pub fn write_content(&self, raw_path: &str, content: &str) -> Result<(), StorageError> {
        let ProjectPath { path, editable } = self.existing(raw_path)?;
        if !editable {
            return Err(StorageError::UnsupportedType(raw_path.to_string()));
        }

        filesystem::write_atomic(&path, content.as_bytes())?;
        warn!(
            "Project file edited outside user namespaces: {} ({} bytes)",
            path.display(),
            content.len()
        );
        Ok(())
    }
}
