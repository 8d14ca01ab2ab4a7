//! Client registry
//!
//! Tracks authenticated sessions so the server can cap how many are active.

use std::collections::HashMap;
use std::net::SocketAddr;

/// Registry of authenticated sessions, keyed by peer address
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashMap<SocketAddr, String>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session unless `max_clients` are already active.
    ///
    /// Re-registering an address replaces its username and always succeeds.
    pub fn try_register(&mut self, addr: SocketAddr, username: &str, max_clients: usize) -> bool {
        if !self.clients.contains_key(&addr) && self.clients.len() >= max_clients {
            return false;
        }
        self.clients.insert(addr, username.to_string());
        true
    }

    pub fn remove(&mut self, addr: &SocketAddr) -> Option<String> {
        self.clients.remove(addr)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }
}
