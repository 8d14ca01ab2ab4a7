//! Identity providers
//!
//! The storage layer only needs a stable `UserId` per session. Where that
//! id comes from is hidden behind `IdentityProvider`.

use std::collections::HashMap;

use crate::auth::validator::{validate_password, validate_username};
use crate::config::UserRecord;
use crate::error::{AuthError, FileServerError};
use crate::storage::UserId;

/// An authenticated user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
    /// Allowed to use project-relative file access
    pub elevated: bool,
}

/// Source of identities for the login protocol
pub trait IdentityProvider: Send + Sync {
    /// Checks that `username` can attempt a login
    fn validate_user(&self, username: &str) -> Result<(), AuthError>;

    /// Verifies credentials and returns the identity behind them
    fn authenticate(&self, username: &str, password: &str) -> Result<Identity, AuthError>;
}

struct Account {
    identity: Identity,
    password: String,
}

/// Accounts listed in the server configuration.
///
/// Passwords are compared as configured; hashing belongs to whatever
/// provider replaces this one.
pub struct ConfiguredIdentityProvider {
    accounts: HashMap<String, Account>,
    max_input_length: usize,
}

impl ConfiguredIdentityProvider {
    pub fn from_records(
        records: &[UserRecord],
        max_input_length: usize,
    ) -> Result<Self, FileServerError> {
        let mut accounts = HashMap::with_capacity(records.len());

        for record in records {
            let user_id = UserId::parse(&record.id)?;
            let account = Account {
                identity: Identity {
                    user_id,
                    username: record.username.clone(),
                    elevated: record.elevated,
                },
                password: record.password.clone(),
            };
            if accounts.insert(record.username.clone(), account).is_some() {
                return Err(FileServerError::Config(format!(
                    "duplicate username: {}",
                    record.username
                )));
            }
        }

        Ok(Self {
            accounts,
            max_input_length,
        })
    }
}

impl IdentityProvider for ConfiguredIdentityProvider {
    fn validate_user(&self, username: &str) -> Result<(), AuthError> {
        validate_username(username, self.max_input_length)?;

        if self.accounts.contains_key(username) {
            Ok(())
        } else {
            Err(AuthError::UserNotFound(username.to_string()))
        }
    }

    fn authenticate(&self, username: &str, password: &str) -> Result<Identity, AuthError> {
        validate_password(password, self.max_input_length)?;

        match self.accounts.get(username) {
            Some(account) if account.password == password => Ok(account.identity.clone()),
            Some(_) => Err(AuthError::InvalidPassword(username.to_string())),
            None => Err(AuthError::UserNotFound(username.to_string())),
        }
    }
}
