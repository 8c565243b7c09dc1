//! # Command Identifiers
//!
//! The 12-byte ASCII command field that names a message's payload type.
//!
//! On the wire a command is exactly [`COMMAND_LEN`] bytes: the ASCII name
//! followed by NUL padding. Validation rejects names over 12 bytes,
//! non-printable bytes, and data after the first NUL, so a [`Command`] value
//! always holds a well-formed field and can serve directly as a lookup key.

use crate::config::COMMAND_LEN;
use crate::error::{FormatViolation, Result};
use std::fmt;

/// A validated wire command: ASCII name, NUL-padded to 12 bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Command([u8; COMMAND_LEN]);

impl Command {
    /// All-NUL field, the placeholder before a real command is assigned.
    pub const EMPTY: Command = Command([0; COMMAND_LEN]);

    pub const VERSION: Command = Command(*b"version\0\0\0\0\0");
    pub const VERACK: Command = Command(*b"verack\0\0\0\0\0\0");
    pub const PING: Command = Command(*b"ping\0\0\0\0\0\0\0\0");
    pub const PONG: Command = Command(*b"pong\0\0\0\0\0\0\0\0");
    pub const GETADDR: Command = Command(*b"getaddr\0\0\0\0\0");

    /// Build a command from its name, padding with NULs.
    pub fn new(name: &str) -> Result<Self> {
        let bytes = name.as_bytes();
        if bytes.len() > COMMAND_LEN {
            return Err(FormatViolation::InvalidCommand.into());
        }
        if !bytes.iter().all(u8::is_ascii_graphic) {
            return Err(FormatViolation::InvalidCommand.into());
        }
        let mut field = [0u8; COMMAND_LEN];
        field[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(field))
    }

    /// Validate a raw wire field: graphic ASCII name, then NULs to the end.
    /// Bytes after the first NUL must themselves be NUL.
    pub fn from_wire(field: [u8; COMMAND_LEN]) -> Result<Self> {
        let mut in_padding = false;
        for &byte in &field {
            if byte == 0 {
                in_padding = true;
            } else if in_padding || !byte.is_ascii_graphic() {
                return Err(FormatViolation::InvalidCommand.into());
            }
        }
        Ok(Self(field))
    }

    /// The command name with NUL padding trimmed.
    pub fn as_str(&self) -> &str {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(COMMAND_LEN);
        // Validated as ASCII at construction
        std::str::from_utf8(&self.0[..end]).unwrap_or("")
    }

    /// The raw 12-byte wire field.
    pub fn as_bytes(&self) -> &[u8; COMMAND_LEN] {
        &self.0
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Command").field(&self.as_str()).finish()
    }
}
