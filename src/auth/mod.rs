//! Authentication system
//!
//! Handles credential validation and maps logins to storage identities.

pub mod credentials;
pub mod validator;

pub use credentials::{ConfiguredIdentityProvider, Identity, IdentityProvider};
