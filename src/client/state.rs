//! Module `state`
//!
//! Defines the `Client` struct and associated methods to manage per-connection
//! state: the username awaiting a password and the authenticated identity.

use std::net::SocketAddr;

use crate::auth::Identity;

/// Represents the state of a connected client.
pub struct Client {
    client_addr: SocketAddr,
    pending_username: Option<String>,
    identity: Option<Identity>,
}

impl Client {
    pub fn new(client_addr: SocketAddr) -> Self {
        Self {
            client_addr,
            pending_username: None,
            identity: None,
        }
    }

    /// Clears the pending username and the authenticated identity.
    pub fn logout(&mut self) {
        self.pending_username = None;
        self.identity = None;
    }

    // --------------------
    // Getter methods
    // --------------------

    /// Returns whether the client has successfully logged in.
    pub fn is_logged_in(&self) -> bool {
        self.identity.is_some()
    }

    /// Returns the authenticated identity, if any.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Returns the username accepted by USER and awaiting PASS.
    pub fn pending_username(&self) -> Option<&str> {
        self.pending_username.as_deref()
    }

    pub fn client_addr(&self) -> SocketAddr {
        self.client_addr
    }

    // --------------------
    // Setter methods
    // --------------------

    /// Records a validated username; any previous login ends.
    pub fn set_pending_username(&mut self, username: Option<String>) {
        self.identity = None;
        self.pending_username = username;
    }

    /// Completes a login.
    pub fn login(&mut self, identity: Identity) {
        self.pending_username = None;
        self.identity = Some(identity);
    }
}
