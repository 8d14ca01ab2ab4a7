//! Command handlers module for the Rax file server.
//!
//! This module defines handler functions for protocol commands: login and
//! logout, and the file operations of the authenticated user's namespace.
//! Handlers perform blocking filesystem I/O and are run off the async
//! session loop.

use log::info;
use std::io;

use crate::auth::Identity;
use crate::client::Client;
use crate::error::{AuthError, FileServerError, StorageError, handle_error};
use crate::protocol::commands::{Command, CommandResult, CommandStatus, PayloadSpec, Reply};
use crate::protocol::responses::{
    FILE_ACTION_OK, GOODBYE, LOGIN_SUCCESS, NO_CONTENT, NOT_LOGGED_IN, OK, PASSWORD_REQUIRED,
    SYNTAX_ERROR, TRANSFER_COMPLETE, data_reply, format_error, format_response,
};
use crate::server::ServerContext;
use crate::storage::{ContentView, Disposition, ProfilePictureLookup};

const JSON: &str = "application/json";

fn success(message: String) -> CommandResult {
    CommandResult {
        status: CommandStatus::Success,
        reply: Reply::Line(message),
    }
}

fn failure(err: FileServerError) -> CommandResult {
    handle_error(&err);
    CommandResult {
        status: CommandStatus::Failure(err.reason().to_string()),
        reply: Reply::Line(format_error(&err)),
    }
}

/// Dispatches a received command to its corresponding handler.
///
/// # Arguments
///
/// * `client` - Mutable reference to the client sending the command.
/// * `command` - The parsed command.
/// * `payload` - Raw bytes that followed the command line, if announced.
/// * `ctx` - Shared server context.
///
/// # Returns
///
/// * `CommandResult` - Result of the command execution, including status and reply.
pub fn handle_command(
    client: &mut Client,
    command: Command,
    payload: Option<Vec<u8>>,
    ctx: &ServerContext,
) -> CommandResult {
    match command {
        Command::QUIT => handle_cmd_quit(client),
        Command::NOOP => success(format_response(OK, "OK")),
        Command::USER(username) => handle_cmd_user(client, &username, ctx),
        Command::PASS(password) => handle_cmd_pass(client, &password, ctx),
        Command::UNKNOWN(raw) => handle_cmd_unknown(&raw),
        command => {
            let Some(identity) = client.identity().cloned() else {
                return failure(AuthError::NotLoggedIn.into());
            };
            match command {
                Command::LOGOUT => handle_cmd_logout(client),
                command => match handle_file_command(&identity, command, payload, ctx) {
                    Ok(reply) => CommandResult {
                        status: CommandStatus::Success,
                        reply,
                    },
                    Err(err) => failure(err),
                },
            }
        }
    }
}

/// Handles the QUIT command: logs out the client and signals connection close.
fn handle_cmd_quit(client: &mut Client) -> CommandResult {
    client.logout();

    CommandResult {
        status: CommandStatus::CloseConnection,
        reply: Reply::Line(format_response(GOODBYE, "Goodbye")),
    }
}

/// Handles the USER command: validates the username and awaits PASS.
fn handle_cmd_user(client: &mut Client, username: &str, ctx: &ServerContext) -> CommandResult {
    match ctx.identities.validate_user(username) {
        Ok(()) => {
            client.set_pending_username(Some(username.to_string()));
            success(format_response(PASSWORD_REQUIRED, "Password required"))
        }
        Err(e) => {
            client.set_pending_username(None);
            failure(e.into())
        }
    }
}

/// Handles the PASS command: authenticates the pending username.
fn handle_cmd_pass(client: &mut Client, password: &str, ctx: &ServerContext) -> CommandResult {
    let Some(username) = client.pending_username().map(str::to_string) else {
        return CommandResult {
            status: CommandStatus::Failure("Username not provided".into()),
            reply: Reply::Line(format_response(
                NOT_LOGGED_IN,
                "Please enter the username first",
            )),
        };
    };

    match ctx.identities.authenticate(&username, password) {
        Ok(identity) => {
            info!(
                "User {} logged in from {} (namespace {})",
                identity.username,
                client.client_addr(),
                identity.user_id
            );
            client.login(identity);
            success(format_response(LOGIN_SUCCESS, "Login successful"))
        }
        Err(e) => {
            client.set_pending_username(None);
            failure(e.into())
        }
    }
}

/// Handles the LOGOUT command: ends the session but keeps the connection.
fn handle_cmd_logout(client: &mut Client) -> CommandResult {
    client.logout();
    success(format_response(GOODBYE, "Logout successful"))
}

fn handle_cmd_unknown(raw: &str) -> CommandResult {
    CommandResult {
        status: CommandStatus::Failure(format!("Unknown command: {raw}")),
        reply: Reply::Line(format_response(SYNTAX_ERROR, "Unknown command")),
    }
}

fn json_reply<T: serde::Serialize>(value: &T) -> Result<Reply, FileServerError> {
    let body = serde_json::to_vec(value).map_err(io::Error::from)?;
    Ok(data_reply(JSON, Disposition::Inline, None, body))
}

fn required_payload(spec: &PayloadSpec, payload: Option<Vec<u8>>) -> Result<Vec<u8>, StorageError> {
    match payload {
        Some(bytes) if !spec.name.is_empty() => Ok(bytes),
        _ => Err(StorageError::MissingFile),
    }
}

fn decode_text(bytes: Vec<u8>) -> Result<String, FileServerError> {
    String::from_utf8(bytes)
        .map_err(|_| FileServerError::Protocol("Payload is not valid UTF-8 text".into()))
}

/// Checks that project file access is enabled and allowed for `identity`
fn require_project_access<'a>(
    identity: &Identity,
    ctx: &'a ServerContext,
) -> Result<&'a crate::storage::ProjectFiles, FileServerError> {
    let project = ctx.project.as_ref().ok_or_else(|| {
        StorageError::PermissionDenied("project file access is disabled".into())
    })?;
    if !identity.elevated {
        return Err(AuthError::InsufficientPrivilege("project file access".into()).into());
    }
    Ok(project)
}

/// Runs a file command against the namespace of `identity`
fn handle_file_command(
    identity: &Identity,
    command: Command,
    payload: Option<Vec<u8>>,
    ctx: &ServerContext,
) -> Result<Reply, FileServerError> {
    let user_id = &identity.user_id;

    match command {
        Command::LIST => {
            let names = ctx.files.list(user_id)?;
            json_reply(&names)
        }
        Command::STOR(spec) => {
            let stored = ctx.files.upload(user_id, &spec.name, payload.as_deref())?;
            Ok(Reply::Line(format_response(
                TRANSFER_COMPLETE,
                &format!("File uploaded: {stored}"),
            )))
        }
        Command::RETR(filename) => {
            let download = ctx.files.download(user_id, &filename)?;
            Ok(data_reply(
                &download.content_type,
                download.disposition,
                Some(&download.filename),
                download.bytes,
            ))
        }
        Command::DEL(filename) => {
            ctx.files.delete(user_id, &filename)?;
            Ok(Reply::Line(format_response(FILE_ACTION_OK, "File deleted")))
        }
        Command::SPIC(spec) => {
            ctx.pictures.set(user_id, &spec.name, payload.as_deref())?;
            Ok(Reply::Line(format_response(
                TRANSFER_COMPLETE,
                "Profile picture updated",
            )))
        }
        Command::GPIC => match ctx.pictures.get(user_id)? {
            ProfilePictureLookup::Found {
                content_type,
                bytes,
                ..
            } => Ok(data_reply(&content_type, Disposition::Inline, None, bytes)),
            ProfilePictureLookup::Absent => Ok(Reply::Line(format_response(
                NO_CONTENT,
                "No profile picture",
            ))),
        },
        Command::READ(filename) => {
            let view: ContentView = ctx.files.read_content(user_id, &filename)?;
            json_reply(&view)
        }
        Command::EDIT(spec) => {
            let bytes = required_payload(&spec, payload)?;
            ctx.files.ensure_exists(user_id, &spec.name)?;
            let text = decode_text(bytes)?;
            ctx.files.write_content(user_id, &spec.name, &text)?;
            Ok(Reply::Line(format_response(FILE_ACTION_OK, "Content saved")))
        }
        Command::PREAD(path) => {
            let project = require_project_access(identity, ctx)?;
            json_reply(&project.read_content(&path)?)
        }
        Command::PEDIT(spec) => {
            let project = require_project_access(identity, ctx)?;
            let bytes = required_payload(&spec, payload)?;
            project.ensure_exists(&spec.name)?;
            let text = decode_text(bytes)?;
            project.write_content(&spec.name, &text)?;
            Ok(Reply::Line(format_response(FILE_ACTION_OK, "Content saved")))
        }
        other => Err(FileServerError::Protocol(format!(
            "Unexpected command: {other:?}"
        ))),
    }
}
