//! Authentication input validation
//!
//! Sanity checks applied to usernames and passwords before any lookup.

use crate::error::AuthError;

/// Performs basic input sanitation to check for malicious or malformed usernames/passwords.
pub fn is_valid_input(input: &str, max_length: usize) -> bool {
    !input.trim().is_empty() && input.len() <= max_length && !input.contains(['\r', '\n', '\0'])
}

/// Checks the shape of a username
pub fn validate_username(username: &str, max_length: usize) -> Result<(), AuthError> {
    if !is_valid_input(username, max_length) {
        return Err(AuthError::MalformedInput("Invalid username format".into()));
    }

    if username.contains(['@', '#', ',', '%', ' ']) {
        return Err(AuthError::InvalidUsername(username.to_string()));
    }

    Ok(())
}

/// Checks the shape of a password
pub fn validate_password(password: &str, max_length: usize) -> Result<(), AuthError> {
    if !is_valid_input(password, max_length) {
        return Err(AuthError::MalformedInput("Invalid password format".into()));
    }
    Ok(())
}
