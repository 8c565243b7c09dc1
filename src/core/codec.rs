//! # Tokio Codec Adapter
//!
//! [`FrameCodec`] implements `tokio_util::codec::{Decoder, Encoder}` over
//! the same frame logic as the synchronous path, so a peer connection is
//! one `Framed::new(stream, FrameCodec::new(..))` away.
//!
//! The decoder resynchronizes the way the byte-stream reader does: bytes
//! before the next occurrence of the network magic are discarded, so a
//! frame boundary is recovered after garbage instead of poisoning the
//! connection. Frame length is validated against the configured ceiling
//! before any buffer space is reserved.

use crate::config::WireConfig;
use crate::core::message::Message;
use crate::core::stream::WireStream;
use crate::error::{FormatViolation, WireError};
use crate::protocol::registry::PayloadRegistry;
use bytes::{Buf, BufMut, BytesMut};
use std::sync::Arc;
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

/// Bytes before the length field: magic (4) + command (12).
const LENGTH_OFFSET: usize = 16;

/// Header size without the checksum field.
const BASE_HEADER: usize = 20;

/// Codec for framed protocol messages over an async byte stream.
///
/// One instance per connection: it owns the per-connection scratch buffer
/// and tracks the frame boundary between reads.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    config: WireConfig,
    registry: Arc<PayloadRegistry>,
    /// Total size of the current frame once its header has been parsed.
    current_frame: Option<usize>,
    scratch: Vec<u8>,
}

impl FrameCodec {
    pub fn new(config: WireConfig, registry: Arc<PayloadRegistry>) -> Self {
        Self {
            config,
            registry,
            current_frame: None,
            scratch: Vec::new(),
        }
    }

    /// The configuration this codec frames against.
    pub fn config(&self) -> &WireConfig {
        &self.config
    }

    /// Adopt a negotiated protocol version for subsequent frames. Call
    /// through `Framed::codec_mut` once the version handshake settles.
    pub fn set_protocol_version(&mut self, version: u32) {
        self.config.protocol_version = version;
    }

    fn header_len(&self) -> usize {
        if self.config.checksum_present(self.config.protocol_version) {
            BASE_HEADER + 4
        } else {
            BASE_HEADER
        }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(WireConfig::default(), Arc::new(PayloadRegistry::default()))
    }
}

/// Position of `magic` in `haystack`, if present.
fn find_magic(haystack: &[u8], magic: [u8; 4]) -> Option<usize> {
    haystack.windows(magic.len()).position(|w| w == magic)
}

impl Decoder for FrameCodec {
    type Item = Message;
    type Error = WireError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.current_frame.is_none() {
            // Find the frame boundary, discarding anything before it
            let magic = self.config.magic.to_le_bytes();
            match find_magic(src, magic) {
                Some(0) => {}
                Some(pos) => {
                    debug!(skipped = pos, "resynchronized to magic");
                    src.advance(pos);
                }
                None => {
                    // Keep a possible partial magic at the tail
                    if src.len() > magic.len() - 1 {
                        let skipped = src.len() - (magic.len() - 1);
                        debug!(skipped, "no magic in buffer, discarding");
                        src.advance(skipped);
                    }
                    return Ok(None);
                }
            }

            if src.len() < self.header_len() {
                return Ok(None);
            }

            let length = u32::from_le_bytes([
                src[LENGTH_OFFSET],
                src[LENGTH_OFFSET + 1],
                src[LENGTH_OFFSET + 2],
                src[LENGTH_OFFSET + 3],
            ]);
            if length > self.config.max_payload_len {
                return Err(FormatViolation::OversizedPayload {
                    len: u64::from(length),
                    max: u64::from(self.config.max_payload_len),
                }
                .into());
            }

            self.current_frame = Some(self.header_len() + length as usize);
        }

        let total = match self.current_frame {
            Some(total) => total,
            None => return Ok(None),
        };

        if src.len() < total {
            // Reserve space for the full frame to avoid reallocations
            src.reserve(total - src.len());
            return Ok(None);
        }

        let frame = src.split_to(total);
        self.current_frame = None;

        let mut source: &[u8] = &frame;
        let mut stream =
            WireStream::reader(&mut source).with_version(self.config.protocol_version);
        let mut message = Message::empty(self.config.magic);
        message.read_write(&mut stream, &self.config, &self.registry, &mut self.scratch)?;
        Ok(Some(message))
    }
}

impl Encoder<Message> for FrameCodec {
    type Error = WireError;

    fn encode(&mut self, message: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut message = message;
        let mut sink = (&mut *dst).writer();
        let mut stream =
            WireStream::writer(&mut sink).with_version(self.config.protocol_version);
        message.read_write(&mut stream, &self.config, &self.registry, &mut self.scratch)
    }
}
