//! File server protocol implementation
//!
//! Handles command parsing, dispatch, and reply generation.

pub mod commands;
pub mod handlers;
pub mod responses;

pub use commands::{Command, CommandResult, CommandStatus, PayloadSpec, Reply, parse_command};
pub use handlers::handle_command;
