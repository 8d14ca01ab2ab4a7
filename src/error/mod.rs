//! Error handling
//!
//! Defines error types and handling for the file server.

pub mod handlers;
pub mod types;

pub use handlers::{ErrorCategory, error_to_reply_code, handle_error};
pub use types::*;
