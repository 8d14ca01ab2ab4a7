//! Error types
//!
//! Defines domain-specific error types for each module of the file server.

use std::io;
use thiserror::Error;

/// Authentication module errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid password for user: {0}")]
    InvalidPassword(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("User not logged in")]
    NotLoggedIn,

    #[error("Insufficient privilege for {0}")]
    InsufficientPrivilege(String),
}

/// Storage module errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Invalid user id: {0}")]
    InvalidUserId(String),

    #[error("No file provided")]
    MissingFile,

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    #[error("File too large: {size} bytes (max {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Cannot edit non-text file: {0}")]
    UnsupportedType(String),

    #[error("Cannot decode {0} as UTF-8 text")]
    Decode(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl StorageError {
    /// Maps an I/O error on `name` to `NotFound` when the file vanished,
    /// keeping every other failure as an I/O error.
    pub fn from_io(name: &str, error: io::Error) -> Self {
        if error.kind() == io::ErrorKind::NotFound {
            StorageError::NotFound(name.to_string())
        } else {
            StorageError::Io(error)
        }
    }
}

/// General file server error that encompasses all error types
#[derive(Debug, Error)]
pub enum FileServerError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl From<config::ConfigError> for FileServerError {
    fn from(error: config::ConfigError) -> Self {
        FileServerError::Config(error.to_string())
    }
}
