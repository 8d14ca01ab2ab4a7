//! Server core functionality
//!
//! This module contains the listener, the accept loop and the context
//! shared by all sessions.

pub mod context;
pub mod core;

pub use context::ServerContext;
pub use core::Server;
