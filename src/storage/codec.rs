//! Content codec
//!
//! Decides whether a stored file is shown as text and converts between its
//! bytes and a text view.

use log::warn;
use mime_guess::mime;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::StorageError;
use crate::storage::catalog;
use crate::storage::docx;
use crate::storage::filesystem;
use crate::storage::results::ContentView;

/// Shown in place of content that cannot be rendered as text
pub const NOT_DISPLAYABLE: &str = "Cannot display non-text file.";

/// How a file's content is surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Decoded as UTF-8 and editable
    Text,
    /// Text extracted paragraph by paragraph; read-only
    StructuredDocument,
    Binary,
}

/// Classifies a path by its extension
pub fn classify(path: &Path) -> FileKind {
    if let Some(traits) = catalog::lookup_path(path) {
        if traits.is_structured_document {
            return FileKind::StructuredDocument;
        }
        if traits.is_text {
            return FileKind::Text;
        }
    }

    match mime_guess::from_path(path).first() {
        Some(guess) if guess.type_() == mime::TEXT => FileKind::Text,
        Some(guess) if guess.essence_str() == mime::APPLICATION_JSON.essence_str() => {
            FileKind::Text
        }
        _ => FileKind::Binary,
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Reads the text view of an existing file.
///
/// A broken structured document is reported inside the view rather than
/// as an error; invalid UTF-8 in a plain text file is an error.
pub fn read(path: &Path) -> Result<ContentView, StorageError> {
    let name = display_name(path);

    match classify(path) {
        FileKind::StructuredDocument => match docx::extract_text(path) {
            Ok(content) => Ok(ContentView::text(content)),
            Err(docx::DocxError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(name))
            }
            Err(e) => {
                warn!("Failed to extract document text from {}: {}", path.display(), e);
                Ok(ContentView::not_text(format!("Error reading docx: {e}")))
            }
        },
        FileKind::Text => match fs::read_to_string(path) {
            Ok(content) => Ok(ContentView::text(content)),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => Err(StorageError::Decode(name)),
            Err(e) => Err(StorageError::from_io(&name, e)),
        },
        FileKind::Binary => Ok(ContentView::not_text(NOT_DISPLAYABLE)),
    }
}

/// Replaces the whole content of a plain text file
pub fn write(path: &Path, content: &str) -> Result<(), StorageError> {
    match classify(path) {
        FileKind::Text => {
            filesystem::write_atomic(path, content.as_bytes())?;
            Ok(())
        }
        FileKind::StructuredDocument | FileKind::Binary => {
            Err(StorageError::UnsupportedType(display_name(path)))
        }
    }
}
