//! Error handlers
//!
//! Classifies errors into client and server failures and maps them to
//! machine-readable reasons and protocol reply codes.

use crate::error::types::{AuthError, FileServerError, StorageError};
use log::{error, warn};

/// Whether a failure was caused by the request or by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Client,
    Server,
}

impl AuthError {
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::InvalidUsername(_) => "INVALID_USERNAME",
            AuthError::InvalidPassword(_) => "INVALID_CREDENTIALS",
            AuthError::UserNotFound(_) => "INVALID_CREDENTIALS",
            AuthError::MalformedInput(_) => "MALFORMED_INPUT",
            AuthError::NotLoggedIn => "NOT_LOGGED_IN",
            AuthError::InsufficientPrivilege(_) => "PERMISSION_DENIED",
        }
    }
}

impl StorageError {
    pub fn reason(&self) -> &'static str {
        match self {
            StorageError::InvalidFilename(_) => "INVALID_FILENAME",
            StorageError::InvalidUserId(_) => "INVALID_USER_ID",
            StorageError::MissingFile => "MISSING_FILE",
            StorageError::NotFound(_) => "NOT_FOUND",
            StorageError::InvalidFileType(_) => "INVALID_FILE_TYPE",
            StorageError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            StorageError::UnsupportedType(_) => "UNSUPPORTED_TYPE",
            StorageError::Decode(_) => "DECODE_ERROR",
            StorageError::PermissionDenied(_) => "PERMISSION_DENIED",
            StorageError::Io(_) => "INTERNAL_ERROR",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            StorageError::Decode(_) | StorageError::Io(_) => ErrorCategory::Server,
            _ => ErrorCategory::Client,
        }
    }
}

impl FileServerError {
    pub fn reason(&self) -> &'static str {
        match self {
            FileServerError::Auth(e) => e.reason(),
            FileServerError::Storage(e) => e.reason(),
            FileServerError::Protocol(_) => "SYNTAX_ERROR",
            FileServerError::Config(_) | FileServerError::Io(_) => "INTERNAL_ERROR",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            FileServerError::Auth(_) | FileServerError::Protocol(_) => ErrorCategory::Client,
            FileServerError::Storage(e) => e.category(),
            FileServerError::Config(_) | FileServerError::Io(_) => ErrorCategory::Server,
        }
    }

    /// Message safe to send to the client; internal details stay in the log
    pub fn public_message(&self) -> String {
        // Unknown user and wrong password must read the same
        if let FileServerError::Auth(AuthError::UserNotFound(_) | AuthError::InvalidPassword(_)) =
            self
        {
            return "Authentication error: Invalid credentials".into();
        }
        match self.category() {
            ErrorCategory::Client => self.to_string(),
            ErrorCategory::Server => "Requested action aborted: local error in processing".into(),
        }
    }
}

/// Log a file server error at a level matching its category
pub fn handle_error(err: &FileServerError) {
    match err.category() {
        ErrorCategory::Client => warn!("Request rejected: {}", err),
        ErrorCategory::Server => error!("File server error: {}", err),
    }
}

/// Convert error to a protocol reply code
pub fn error_to_reply_code(err: &FileServerError) -> u16 {
    match err {
        FileServerError::Auth(AuthError::InsufficientPrivilege(_)) => 550,
        FileServerError::Auth(_) => 530,
        FileServerError::Storage(e) => match e {
            StorageError::InvalidFilename(_) => 553,
            StorageError::InvalidUserId(_) => 553,
            StorageError::MissingFile => 501,
            StorageError::NotFound(_) => 550,
            StorageError::InvalidFileType(_) => 504,
            StorageError::FileTooLarge { .. } => 552,
            StorageError::UnsupportedType(_) => 504,
            StorageError::PermissionDenied(_) => 550,
            StorageError::Decode(_) | StorageError::Io(_) => 451,
        },
        FileServerError::Protocol(_) => 501,
        FileServerError::Config(_) | FileServerError::Io(_) => 451,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_client_errors_use_permanent_codes() {
        let err = FileServerError::from(StorageError::NotFound("a.txt".into()));
        assert_eq!(error_to_reply_code(&err), 550);
        assert_eq!(err.reason(), "NOT_FOUND");
        assert_eq!(err.category(), ErrorCategory::Client);
        assert_eq!(err.public_message(), "Storage error: File not found: a.txt");
    }

    #[test]
    fn test_io_errors_are_server_errors_with_hidden_details() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "disk says no");
        let err = FileServerError::from(StorageError::from_io("a.txt", io_err));
        assert_eq!(error_to_reply_code(&err), 451);
        assert_eq!(err.reason(), "INTERNAL_ERROR");
        assert_eq!(err.category(), ErrorCategory::Server);
        assert!(!err.public_message().contains("disk says no"));
    }

    #[test]
    fn test_credential_failures_share_one_message() {
        let unknown = FileServerError::from(AuthError::UserNotFound("bob".into()));
        let wrong = FileServerError::from(AuthError::InvalidPassword("alice".into()));

        assert_eq!(unknown.public_message(), wrong.public_message());
        assert!(!unknown.public_message().contains("bob"));
        assert_eq!(error_to_reply_code(&unknown), 530);
        assert_eq!(unknown.reason(), "INVALID_CREDENTIALS");
    }

    #[test]
    fn test_vanished_file_maps_to_not_found() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert!(matches!(
            StorageError::from_io("a.txt", io_err),
            StorageError::NotFound(name) if name == "a.txt"
        ));
    }
}
