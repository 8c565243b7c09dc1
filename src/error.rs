//! # Error Types
//!
//! Comprehensive error handling for the wire codec.
//!
//! This module defines all error variants that can occur while framing or
//! parsing protocol messages, from low-level I/O errors to frame-format
//! violations.
//!
//! ## Error Categories
//! - **I/O Errors**: Transport read/write failures
//! - **Format Errors**: Malformed frames (bad magic, oversized length, checksum mismatch)
//! - **Cancellation**: A read aborted through a cancellation token
//! - **Usage Errors**: Library misuse, such as serializing a message without a payload
//!
//! An unrecognized command is deliberately *not* an error: it decodes into
//! the fallback payload so unknown message types pass through losslessly.
//!
//! ## Example Usage
//! ```rust
//! use p2p_wire::error::{Result, WireError};
//!
//! fn classify(res: Result<()>) -> &'static str {
//!     match res {
//!         Ok(()) => "ok",
//!         Err(e) if e.is_format() => "drop frame, keep connection",
//!         Err(WireError::Cancelled) => "shutting down",
//!         Err(_) => "connection lost",
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
/// Static strings are borrowed, avoiding heap allocations for common error cases.
pub mod constants {
    /// Frame validation errors
    pub const ERR_EOF_IN_FRAME: &str = "Stream ended inside a frame";

    /// Context usage errors
    pub const ERR_READ_ON_WRITER: &str = "read_to_end called on a writing stream";
}

/// A frame-level format violation.
///
/// Format errors mean the bytes on the wire do not form a valid frame. The
/// failing frame is discarded before any payload parsing; callers typically
/// drop it (or the peer) without tearing down unrelated state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatViolation {
    #[error("Magic mismatch: expected {expected:#010x}, found {found:#010x}")]
    MagicMismatch { expected: u32, found: u32 },

    #[error("Magic not found before end of stream")]
    MagicNotFound,

    #[error("Declared payload length {len} exceeds maximum {max}")]
    OversizedPayload { len: u64, max: u64 },

    #[error("Checksum mismatch: header {expected:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { expected: u32, computed: u32 },

    #[error("Invalid command encoding")]
    InvalidCommand,

    #[error("Non-canonical compact-size encoding of {0}")]
    NonCanonicalVarint(u64),

    #[error("Var-string is not valid UTF-8")]
    InvalidString,

    #[error("Payload parser left {0} bytes unread")]
    TrailingBytes(usize),
}

// WireError is the primary error type for all codec operations
#[derive(Error, Debug)]
pub enum WireError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed frame: {0}")]
    Format(#[from] FormatViolation),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Message has no payload assigned")]
    MissingPayload,

    #[error("Invalid use of the codec API: {0}")]
    Usage(&'static str),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl WireError {
    /// True when the error is a frame-format violation (recoverable by
    /// discarding the frame).
    pub fn is_format(&self) -> bool {
        matches!(self, WireError::Format(_))
    }

    /// True when the error is a cancellation outcome rather than a fault.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WireError::Cancelled)
    }
}

/// Type alias for Results using WireError
pub type Result<T> = std::result::Result<T, WireError>;
