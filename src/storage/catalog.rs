//! File type catalog
//!
//! Single table of the extensions the server treats specially. Content
//! classification, profile picture validation and project file access all
//! consult it.

use std::path::Path;

/// Traits of a catalogued extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTraits {
    pub is_image: bool,
    pub is_text: bool,
    pub is_structured_document: bool,
    /// Editable through project-relative access
    pub project_editable: bool,
}

const IMAGE: FileTraits = FileTraits {
    is_image: true,
    is_text: false,
    is_structured_document: false,
    project_editable: false,
};

const PLAIN_TEXT: FileTraits = FileTraits {
    is_image: false,
    is_text: true,
    is_structured_document: false,
    project_editable: true,
};

const STRUCTURED_DOCUMENT: FileTraits = FileTraits {
    is_image: false,
    is_text: true,
    is_structured_document: true,
    project_editable: false,
};

/// Image entries come first, in profile picture probe order.
const CATALOG: &[(&str, FileTraits)] = &[
    ("png", IMAGE),
    ("jpg", IMAGE),
    ("jpeg", IMAGE),
    ("docx", STRUCTURED_DOCUMENT),
    ("txt", PLAIN_TEXT),
    ("csv", PLAIN_TEXT),
    ("json", PLAIN_TEXT),
];

/// Stem of the reserved profile picture file names
pub const PROFILE_STEM: &str = "profile";

/// Look up an extension, ignoring case and a leading dot
pub fn lookup(extension: &str) -> Option<FileTraits> {
    let extension = extension.trim_start_matches('.');
    CATALOG
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
        .map(|(_, traits)| *traits)
}

/// Traits for the extension of `path`, if catalogued
pub fn lookup_path(path: &Path) -> Option<FileTraits> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(lookup)
}

/// Image extensions in the fixed profile picture probe order
pub fn image_extensions() -> impl Iterator<Item = &'static str> {
    CATALOG
        .iter()
        .filter(|(_, traits)| traits.is_image)
        .map(|(ext, _)| *ext)
}

/// Lowercased extension of a file name, if it has one
pub fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Name of the profile picture slot for an image extension
pub fn profile_file_name(extension: &str) -> String {
    format!("{PROFILE_STEM}.{extension}")
}

/// True exactly for `profile.<image extension>`
pub fn is_reserved_profile_name(name: &str) -> bool {
    match name.split_once('.') {
        Some((stem, ext)) => {
            stem == PROFILE_STEM && image_extensions().any(|image| image == ext)
        }
        None => false,
    }
}
