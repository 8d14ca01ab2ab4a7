//! Storage result types
//!
//! Defines result structures returned by storage operations.

use serde::Serialize;

/// How a client should present downloaded bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Save to disk instead of rendering
    Attachment,
    Inline,
}

/// Result of a file download
#[derive(Debug, Clone)]
pub struct Download {
    pub filename: String,
    pub content_type: String,
    pub disposition: Disposition,
    pub bytes: Vec<u8>,
}

/// Text projection of a stored file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentView {
    pub is_text: bool,
    pub content: String,
}

impl ContentView {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            is_text: true,
            content: content.into(),
        }
    }

    pub fn not_text(content: impl Into<String>) -> Self {
        Self {
            is_text: false,
            content: content.into(),
        }
    }
}

/// Result of a profile picture lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfilePictureLookup {
    Found {
        extension: &'static str,
        content_type: String,
        bytes: Vec<u8>,
    },
    Absent,
}
