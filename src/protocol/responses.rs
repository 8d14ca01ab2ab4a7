//! Reply formatting
//!
//! Defines reply codes and the framing of line and data replies.

use crate::error::{FileServerError, error_to_reply_code};
use crate::protocol::commands::Reply;
use crate::storage::Disposition;

/// Standard reply codes
pub const TRANSFER_STARTING: u16 = 150;
pub const OK: u16 = 200;
pub const NO_CONTENT: u16 = 204;
pub const READY: u16 = 220;
pub const GOODBYE: u16 = 221;
pub const TRANSFER_COMPLETE: u16 = 226;
pub const LOGIN_SUCCESS: u16 = 230;
pub const FILE_ACTION_OK: u16 = 250;
pub const PASSWORD_REQUIRED: u16 = 331;
pub const SERVICE_UNAVAILABLE: u16 = 421;
pub const SYNTAX_ERROR: u16 = 500;
pub const NOT_LOGGED_IN: u16 = 530;
pub const STORAGE_EXCEEDED: u16 = 552;

/// Sent after the body of every data reply
pub const TRANSFER_COMPLETE_LINE: &str = "226 Transfer complete\r\n";

/// Format a reply line
pub fn format_response(code: u16, message: &str) -> String {
    format!("{code} {message}\r\n")
}

/// Format an error as `<code> <REASON> <message>`
pub fn format_error(err: &FileServerError) -> String {
    format!(
        "{} {} {}\r\n",
        error_to_reply_code(err),
        err.reason(),
        err.public_message()
    )
}

fn disposition_token(disposition: Disposition, filename: Option<&str>) -> String {
    match (disposition, filename) {
        (Disposition::Attachment, Some(name)) => format!("attachment;filename=\"{name}\""),
        (Disposition::Attachment, None) => "attachment".to_string(),
        (Disposition::Inline, _) => "inline".to_string(),
    }
}

/// Build a data reply announcing `body.len()` bytes
pub fn data_reply(
    content_type: &str,
    disposition: Disposition,
    filename: Option<&str>,
    body: Vec<u8>,
) -> Reply {
    let header = format!(
        "{} {} {} {}\r\n",
        TRANSFER_STARTING,
        body.len(),
        content_type,
        disposition_token(disposition, filename)
    );
    Reply::Data { header, body }
}
