//! Module `commands`
//!
//! Defines the command parsing logic and related data structures used to
//! represent commands, their status and their replies.

/// A name followed by the byte length of the payload that trails the line
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PayloadSpec {
    pub name: String,
    pub size: Option<u64>,
}

/// Represents a command parsed from the client input.
///
/// Commands that require arguments store them as `String` variants; those
/// followed by raw bytes carry a `PayloadSpec`.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    QUIT,
    NOOP,
    LOGOUT,
    USER(String),       // Username for login
    PASS(String),       // Password for login
    LIST,               // List own files
    STOR(PayloadSpec),  // Upload a file
    RETR(String),       // Download a file
    DEL(String),        // Delete a file
    SPIC(PayloadSpec),  // Set the profile picture
    GPIC,               // Get the profile picture
    READ(String),       // Read file content as text
    EDIT(PayloadSpec),  // Replace text content
    PREAD(String),      // Read a project file
    PEDIT(PayloadSpec), // Replace a project file
    UNKNOWN(String),    // Unknown or unsupported command
}

impl Command {
    /// Number of raw bytes that follow the command line
    pub fn payload_size(&self) -> Option<u64> {
        match self {
            Command::STOR(spec)
            | Command::SPIC(spec)
            | Command::EDIT(spec)
            | Command::PEDIT(spec) => spec.size,
            _ => None,
        }
    }
}

/// Represents the outcome status of executing a command.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// What is written back to the client
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    Line(String),
    /// Header line, then exactly `body.len()` raw bytes, then a completion line
    Data { header: String, body: Vec<u8> },
}

/// Struct encapsulating the full result of a command execution.
#[derive(Debug)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub reply: Reply,
}

fn parse_payload_spec(arg: &str) -> PayloadSpec {
    if let Some((name, size)) = arg.rsplit_once(char::is_whitespace) {
        if let Ok(size) = size.parse::<u64>() {
            return PayloadSpec {
                name: name.trim().to_string(),
                size: Some(size),
            };
        }
    }
    PayloadSpec {
        name: arg.to_string(),
        size: None,
    }
}

/// Parses a raw command line received from a client into a `Command`.
///
/// Returns `UNKNOWN` if a known command is missing a required argument.
/// Payload commands with a missing name or size still parse, so the
/// handler can report the missing file.
pub fn parse_command(raw: &str) -> Command {
    let trimmed = raw.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("").to_ascii_uppercase();
    let arg = parts.next().unwrap_or("").trim();

    match cmd.as_str() {
        "QUIT" | "Q" => Command::QUIT,
        "NOOP" => Command::NOOP,
        "LOGOUT" => Command::LOGOUT,
        "USER" if !arg.is_empty() => Command::USER(arg.to_string()),
        "PASS" if !arg.is_empty() => Command::PASS(arg.to_string()),
        "LIST" => Command::LIST,
        "STOR" => Command::STOR(parse_payload_spec(arg)),
        "RETR" if !arg.is_empty() => Command::RETR(arg.to_string()),
        "DEL" if !arg.is_empty() => Command::DEL(arg.to_string()),
        "SPIC" => Command::SPIC(parse_payload_spec(arg)),
        "GPIC" => Command::GPIC,
        "READ" if !arg.is_empty() => Command::READ(arg.to_string()),
        "EDIT" => Command::EDIT(parse_payload_spec(arg)),
        "PREAD" if !arg.is_empty() => Command::PREAD(arg.to_string()),
        "PEDIT" => Command::PEDIT(parse_payload_spec(arg)),
        _ => Command::UNKNOWN(trimmed.to_string()),
    }
}
