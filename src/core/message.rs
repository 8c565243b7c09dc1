//! # Message Codec
//!
//! The frame state machine: one typed message per wire frame.
//!
//! ## Wire Format
//! ```text
//! [Magic(4)] [Command(12)] [Length(4)] [Checksum(4)?] [Payload(N)]
//! ```
//! All integers little-endian. The checksum field exists only when the
//! stream's protocol version is at or above the configured checksum gate.
//!
//! ## Security
//! - The declared length is validated against the configured ceiling
//!   *before* any payload allocation
//! - The checksum is verified before the payload is parsed; a corrupt
//!   frame is rejected without side effects
//! - A partially read frame is never surfaced: any mid-frame failure
//!   returns an error and leaves the message unassigned
//!
//! Payload bytes move through a caller-owned scratch buffer, so steady
//! state message traffic does not allocate per frame.

use crate::config::WireConfig;
use crate::core::checksum::checksum_of;
use crate::core::stream::WireStream;
use crate::error::{FormatViolation, Result, WireError};
use crate::protocol::command::Command;
use crate::protocol::payload::Payload;
use crate::protocol::registry::PayloadRegistry;
use std::ops::{Deref, DerefMut};
use tracing::{debug, warn};

/// A framed protocol message: network magic, command, and typed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    magic: u32,
    command: Command,
    payload: Option<Payload>,
    skip_magic: bool,
}

impl Message {
    /// A message carrying `payload`, framed for the network `magic`.
    pub fn new(magic: u32, payload: Payload) -> Self {
        Self {
            magic,
            command: payload.command(),
            payload: Some(payload),
            skip_magic: false,
        }
    }

    /// An unassigned message, ready to be read into. Serializing it before
    /// a payload is assigned is an error.
    pub fn empty(magic: u32) -> Self {
        Self {
            magic,
            command: Command::EMPTY,
            payload: None,
            skip_magic: false,
        }
    }

    pub fn magic(&self) -> u32 {
        self.magic
    }

    pub fn set_magic(&mut self, magic: u32) {
        self.magic = magic;
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    pub fn payload_mut(&mut self) -> Option<&mut Payload> {
        self.payload.as_mut()
    }

    /// Assign a payload, re-deriving the command from it.
    pub fn set_payload(&mut self, payload: Payload) {
        self.command = payload.command();
        self.payload = Some(payload);
    }

    /// Take the payload out, leaving the message unassigned.
    pub fn take_payload(&mut self) -> Option<Payload> {
        self.payload.take()
    }

    /// Whether the magic field is currently skipped (a resync pass already
    /// consumed it from the stream).
    pub fn skip_magic(&self) -> bool {
        self.skip_magic
    }

    /// Serialize or parse one frame against `stream`.
    ///
    /// `scratch` stages the payload bytes; it is grown on demand, reused
    /// when large enough, and never retained. On a reading stream, the
    /// message's fields are only assigned once the whole frame has been
    /// validated.
    pub fn read_write(
        &mut self,
        stream: &mut WireStream<'_>,
        config: &WireConfig,
        registry: &PayloadRegistry,
        scratch: &mut Vec<u8>,
    ) -> Result<()> {
        if stream.is_serializing() {
            self.write_frame(stream, config, scratch)
        } else {
            self.read_frame(stream, config, registry, scratch)
        }
    }

    fn write_frame(
        &mut self,
        stream: &mut WireStream<'_>,
        config: &WireConfig,
        scratch: &mut Vec<u8>,
    ) -> Result<()> {
        let payload = self.payload.as_mut().ok_or(WireError::MissingPayload)?;
        self.command = payload.command();

        // Stage the payload body first; the header needs its length
        scratch.clear();
        {
            let mut body = stream.derive_writer(scratch);
            payload.read_write(&mut body)?;
        }
        if scratch.len() as u64 > u64::from(config.max_payload_len) {
            return Err(FormatViolation::OversizedPayload {
                len: scratch.len() as u64,
                max: u64::from(config.max_payload_len),
            }
            .into());
        }

        if !self.skip_magic {
            stream.read_write_u32(&mut self.magic)?;
        }
        let mut command = *self.command.as_bytes();
        stream.read_write_bytes(&mut command)?;
        let mut length = scratch.len() as u32;
        stream.read_write_u32(&mut length)?;
        if config.checksum_present(stream.protocol_version()) {
            let mut checksum = checksum_of(scratch);
            stream.read_write_u32(&mut checksum)?;
        }
        stream.read_write_bytes(scratch)
    }

    fn read_frame(
        &mut self,
        stream: &mut WireStream<'_>,
        config: &WireConfig,
        registry: &PayloadRegistry,
        scratch: &mut Vec<u8>,
    ) -> Result<()> {
        let mut magic = self.magic;
        if !self.skip_magic {
            magic = 0;
            stream.read_write_u32(&mut magic)?;
            if magic != config.magic {
                return Err(FormatViolation::MagicMismatch {
                    expected: config.magic,
                    found: magic,
                }
                .into());
            }
        }

        let mut field = [0u8; crate::config::COMMAND_LEN];
        stream.read_write_bytes(&mut field)?;
        let command = Command::from_wire(field)?;

        let mut length = 0u32;
        stream.read_write_u32(&mut length)?;
        if length > config.max_payload_len {
            return Err(FormatViolation::OversizedPayload {
                len: u64::from(length),
                max: u64::from(config.max_payload_len),
            }
            .into());
        }

        let mut expected_checksum = None;
        if config.checksum_present(stream.protocol_version()) {
            let mut checksum = 0u32;
            stream.read_write_u32(&mut checksum)?;
            expected_checksum = Some(checksum);
        }

        scratch.clear();
        scratch.resize(length as usize, 0);
        stream.read_write_bytes(scratch)?;

        if let Some(expected) = expected_checksum {
            let computed = checksum_of(scratch);
            if computed != expected {
                warn!(command = %command, expected, computed, "discarding frame with bad checksum");
                return Err(FormatViolation::ChecksumMismatch { expected, computed }.into());
            }
        }

        let mut payload = registry.resolve(command)();
        if let Payload::Unknown(body) = &mut payload {
            body.command = command;
            debug!(command = %command, length, "no typed payload for command, keeping raw bytes");
        }

        let mut body: &[u8] = scratch.as_slice();
        {
            let mut context = stream.derive(&mut body);
            payload.read_write(&mut context)?;
        }
        if !body.is_empty() {
            return Err(FormatViolation::TrailingBytes(body.len()).into());
        }

        self.magic = magic;
        self.command = command;
        self.payload = Some(payload);
        Ok(())
    }
}

/// Scoped skip-magic override.
///
/// While the guard lives, the wrapped message's frame operations neither
/// emit nor expect the magic field; the prior setting is restored when the
/// guard drops, on every exit path.
pub struct SkipMagicScope<'a> {
    message: &'a mut Message,
    prior: bool,
}

impl<'a> SkipMagicScope<'a> {
    pub fn new(message: &'a mut Message) -> Self {
        let prior = message.skip_magic;
        message.skip_magic = true;
        Self { message, prior }
    }
}

impl Deref for SkipMagicScope<'_> {
    type Target = Message;

    fn deref(&self) -> &Message {
        self.message
    }
}

impl DerefMut for SkipMagicScope<'_> {
    fn deref_mut(&mut self) -> &mut Message {
        self.message
    }
}

impl Drop for SkipMagicScope<'_> {
    fn drop(&mut self) {
        self.message.skip_magic = self.prior;
    }
}
