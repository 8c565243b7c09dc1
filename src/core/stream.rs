//! # Serialization Context
//!
//! Directional cursor over a byte stream, used by every wire type.
//!
//! A [`WireStream`] wraps either a reader or a writer and exposes one
//! `read_write_*` method per primitive. In writing mode the method emits the
//! value; in reading mode it overwrites the value in place. Payload code is
//! therefore written once and works in both directions.
//!
//! The context also carries the negotiated protocol version (payload
//! encodings may vary by version), a cancellation token observed between
//! I/O chunks, and a byte counter.
//!
//! ## Wire Primitives
//! - Fixed-width integers, little-endian (`u8` through `u64`, `i32`, `i64`)
//! - Big-endian `u16` (network byte order, used only for ports)
//! - Compact-size varints, canonical encoding enforced on read
//! - Length-prefixed byte vectors and UTF-8 strings
//! - Trailing optional fields, absent at clean end-of-stream

use crate::config::MAX_PAYLOAD_LEN;
use crate::error::{constants, FormatViolation, Result, WireError};
use std::io::{self, Read, Write};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Chunk size for cancellable bulk reads.
const READ_CHUNK: usize = 8 * 1024;

/// Pause before retrying a read that reported `WouldBlock` or `TimedOut`.
const RETRY_DELAY: Duration = Duration::from_millis(1);

/// Bytes moved through a [`WireStream`], split by direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByteCounter {
    read: u64,
    written: u64,
}

impl ByteCounter {
    /// Total bytes consumed from the underlying reader.
    pub fn bytes_read(&self) -> u64 {
        self.read
    }

    /// Total bytes emitted to the underlying writer.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    fn add_read(&mut self, n: usize) {
        self.read += n as u64;
    }

    fn add_written(&mut self, n: usize) {
        self.written += n as u64;
    }
}

enum StreamIo<'a> {
    Reader(&'a mut dyn Read),
    Writer(&'a mut dyn Write),
}

/// Directional serialization context over a byte stream.
pub struct WireStream<'a> {
    io: StreamIo<'a>,
    protocol_version: u32,
    cancel: CancellationToken,
    counter: ByteCounter,
}

impl<'a> WireStream<'a> {
    /// Create a reading (deserializing) context.
    pub fn reader(source: &'a mut dyn Read) -> Self {
        Self {
            io: StreamIo::Reader(source),
            protocol_version: crate::config::PROTOCOL_VERSION,
            cancel: CancellationToken::new(),
            counter: ByteCounter::default(),
        }
    }

    /// Create a writing (serializing) context.
    pub fn writer(sink: &'a mut dyn Write) -> Self {
        Self {
            io: StreamIo::Writer(sink),
            protocol_version: crate::config::PROTOCOL_VERSION,
            cancel: CancellationToken::new(),
            counter: ByteCounter::default(),
        }
    }

    /// Set the protocol version payload encodings should target.
    #[must_use]
    pub fn with_version(mut self, version: u32) -> Self {
        self.protocol_version = version;
        self
    }

    /// Attach a cancellation token, observed between I/O chunks.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Whether this context writes (`true`) or reads (`false`).
    pub fn is_serializing(&self) -> bool {
        matches!(self.io, StreamIo::Writer(_))
    }

    /// The protocol version in effect for payload encodings.
    pub fn protocol_version(&self) -> u32 {
        self.protocol_version
    }

    /// Change the protocol version mid-stream (version negotiation).
    pub fn set_protocol_version(&mut self, version: u32) {
        self.protocol_version = version;
    }

    /// Snapshot of bytes moved through this context so far.
    pub fn counter(&self) -> ByteCounter {
        self.counter
    }

    /// The cancellation token this context observes.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Child reading context over `source`, inheriting protocol version and
    /// cancellation token. Used to parse a payload body out of an in-memory
    /// buffer under the same settings as the parent frame.
    pub fn derive<'b>(&self, source: &'b mut dyn Read) -> WireStream<'b> {
        WireStream {
            io: StreamIo::Reader(source),
            protocol_version: self.protocol_version,
            cancel: self.cancel.clone(),
            counter: ByteCounter::default(),
        }
    }

    /// Child writing context over `sink`, inheriting protocol version and
    /// cancellation token.
    pub fn derive_writer<'b>(&self, sink: &'b mut dyn Write) -> WireStream<'b> {
        WireStream {
            io: StreamIo::Writer(sink),
            protocol_version: self.protocol_version,
            cancel: self.cancel.clone(),
            counter: ByteCounter::default(),
        }
    }

    /// Move `buf.len()` raw bytes through the stream: written verbatim when
    /// serializing, filled exactly when reading.
    pub fn read_write_bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        match &mut self.io {
            StreamIo::Writer(sink) => {
                sink.write_all(buf)?;
                self.counter.add_written(buf.len());
                Ok(())
            }
            StreamIo::Reader(source) => {
                fill_exact(&mut **source, &self.cancel, &mut self.counter, buf)
            }
        }
    }

    pub fn read_write_u8(&mut self, value: &mut u8) -> Result<()> {
        let mut buf = [*value];
        self.read_write_bytes(&mut buf)?;
        *value = buf[0];
        Ok(())
    }

    pub fn read_write_u16(&mut self, value: &mut u16) -> Result<()> {
        let mut buf = value.to_le_bytes();
        self.read_write_bytes(&mut buf)?;
        *value = u16::from_le_bytes(buf);
        Ok(())
    }

    /// Big-endian `u16`. The wire format is little-endian except for port
    /// numbers, which keep network byte order.
    pub fn read_write_u16_be(&mut self, value: &mut u16) -> Result<()> {
        let mut buf = value.to_be_bytes();
        self.read_write_bytes(&mut buf)?;
        *value = u16::from_be_bytes(buf);
        Ok(())
    }

    pub fn read_write_u32(&mut self, value: &mut u32) -> Result<()> {
        let mut buf = value.to_le_bytes();
        self.read_write_bytes(&mut buf)?;
        *value = u32::from_le_bytes(buf);
        Ok(())
    }

    pub fn read_write_u64(&mut self, value: &mut u64) -> Result<()> {
        let mut buf = value.to_le_bytes();
        self.read_write_bytes(&mut buf)?;
        *value = u64::from_le_bytes(buf);
        Ok(())
    }

    pub fn read_write_i32(&mut self, value: &mut i32) -> Result<()> {
        let mut buf = value.to_le_bytes();
        self.read_write_bytes(&mut buf)?;
        *value = i32::from_le_bytes(buf);
        Ok(())
    }

    pub fn read_write_i64(&mut self, value: &mut i64) -> Result<()> {
        let mut buf = value.to_le_bytes();
        self.read_write_bytes(&mut buf)?;
        *value = i64::from_le_bytes(buf);
        Ok(())
    }

    /// Compact-size varint. Reading rejects non-canonical encodings (a
    /// value carried in a wider form than it needs).
    pub fn read_write_varint(&mut self, value: &mut u64) -> Result<()> {
        if self.is_serializing() {
            let v = *value;
            if v < 0xFD {
                self.read_write_u8(&mut (v as u8))
            } else if v <= 0xFFFF {
                self.read_write_u8(&mut 0xFDu8)?;
                self.read_write_u16(&mut (v as u16))
            } else if v <= 0xFFFF_FFFF {
                self.read_write_u8(&mut 0xFEu8)?;
                self.read_write_u32(&mut (v as u32))
            } else {
                self.read_write_u8(&mut 0xFFu8)?;
                let mut wide = v;
                self.read_write_u64(&mut wide)
            }
        } else {
            let mut marker = 0u8;
            self.read_write_u8(&mut marker)?;
            *value = match marker {
                0xFD => {
                    let mut v = 0u16;
                    self.read_write_u16(&mut v)?;
                    if v < 0xFD {
                        return Err(FormatViolation::NonCanonicalVarint(u64::from(v)).into());
                    }
                    u64::from(v)
                }
                0xFE => {
                    let mut v = 0u32;
                    self.read_write_u32(&mut v)?;
                    if v <= 0xFFFF {
                        return Err(FormatViolation::NonCanonicalVarint(u64::from(v)).into());
                    }
                    u64::from(v)
                }
                0xFF => {
                    let mut v = 0u64;
                    self.read_write_u64(&mut v)?;
                    if v <= 0xFFFF_FFFF {
                        return Err(FormatViolation::NonCanonicalVarint(v).into());
                    }
                    v
                }
                direct => u64::from(direct),
            };
            Ok(())
        }
    }

    /// Compact-size-prefixed byte vector. Lengths above the payload ceiling
    /// are rejected before any allocation.
    pub fn read_write_var_bytes(&mut self, bytes: &mut Vec<u8>) -> Result<()> {
        if self.is_serializing() {
            let mut len = bytes.len() as u64;
            self.read_write_varint(&mut len)?;
            self.read_write_bytes(bytes)?;
        } else {
            let mut len = 0u64;
            self.read_write_varint(&mut len)?;
            if len > u64::from(MAX_PAYLOAD_LEN) {
                return Err(FormatViolation::OversizedPayload {
                    len,
                    max: u64::from(MAX_PAYLOAD_LEN),
                }
                .into());
            }
            bytes.clear();
            bytes.resize(len as usize, 0);
            self.read_write_bytes(bytes)?;
        }
        Ok(())
    }

    /// Compact-size-prefixed UTF-8 string (user agent and friends).
    pub fn read_write_var_string(&mut self, value: &mut String) -> Result<()> {
        if self.is_serializing() {
            let mut bytes = value.clone().into_bytes();
            self.read_write_var_bytes(&mut bytes)
        } else {
            let mut bytes = Vec::new();
            self.read_write_var_bytes(&mut bytes)?;
            *value =
                String::from_utf8(bytes).map_err(|_| FormatViolation::InvalidString)?;
            Ok(())
        }
    }

    /// Trailing optional boolean: one byte when present, absent at clean
    /// end-of-stream. Only meaningful as the last field of a payload.
    pub fn read_write_bool_opt(&mut self, value: &mut Option<bool>) -> Result<()> {
        if self.is_serializing() {
            if let Some(flag) = *value {
                self.read_write_u8(&mut u8::from(flag))?;
            }
            Ok(())
        } else {
            let mut buf = [0u8; 1];
            if self.fill_or_eof(&mut buf)? {
                *value = Some(buf[0] != 0);
            } else {
                *value = None;
            }
            Ok(())
        }
    }

    /// Trailing optional `u64`, same end-of-stream rule as
    /// [`read_write_bool_opt`](Self::read_write_bool_opt).
    pub fn read_write_u64_opt(&mut self, value: &mut Option<u64>) -> Result<()> {
        if self.is_serializing() {
            if let Some(mut v) = *value {
                self.read_write_u64(&mut v)?;
            }
            Ok(())
        } else {
            let mut buf = [0u8; 8];
            if self.fill_or_eof(&mut buf)? {
                *value = Some(u64::from_le_bytes(buf));
            } else {
                *value = None;
            }
            Ok(())
        }
    }

    /// Consume the remainder of a reading context into `out`. Used for the
    /// fallback payload, whose body is whatever bytes the frame carried.
    /// Capped at the payload ceiling; callers always hand in a bounded
    /// source (the frame's payload buffer).
    pub fn read_to_end(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let source = match &mut self.io {
            StreamIo::Reader(source) => source,
            StreamIo::Writer(_) => {
                return Err(WireError::Usage(constants::ERR_READ_ON_WRITER))
            }
        };

        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if self.cancel.is_cancelled() {
                return Err(WireError::Cancelled);
            }
            match source.read(&mut chunk) {
                Ok(0) => return Ok(()),
                Ok(n) => {
                    if out.len() + n > MAX_PAYLOAD_LEN as usize {
                        return Err(FormatViolation::OversizedPayload {
                            len: (out.len() + n) as u64,
                            max: u64::from(MAX_PAYLOAD_LEN),
                        }
                        .into());
                    }
                    out.extend_from_slice(&chunk[..n]);
                    self.counter.add_read(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if retryable(e.kind()) => std::thread::sleep(RETRY_DELAY),
                Err(e) => return Err(WireError::Io(e)),
            }
        }
    }

    /// Fill `buf` exactly, or report a clean end-of-stream *before the
    /// first byte* as `Ok(false)`. End-of-stream mid-buffer is still an
    /// error: a half-read field means the frame was truncated.
    fn fill_or_eof(&mut self, buf: &mut [u8]) -> Result<bool> {
        let source = match &mut self.io {
            StreamIo::Reader(source) => source,
            StreamIo::Writer(_) => {
                return Err(WireError::Usage(constants::ERR_READ_ON_WRITER))
            }
        };

        let mut filled = 0;
        while filled < buf.len() {
            if self.cancel.is_cancelled() {
                return Err(WireError::Cancelled);
            }
            match source.read(&mut buf[filled..]) {
                Ok(0) if filled == 0 => return Ok(false),
                Ok(0) => {
                    return Err(WireError::Io(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        constants::ERR_EOF_IN_FRAME,
                    )))
                }
                Ok(n) => {
                    filled += n;
                    self.counter.add_read(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if retryable(e.kind()) => std::thread::sleep(RETRY_DELAY),
                Err(e) => return Err(WireError::Io(e)),
            }
        }
        Ok(true)
    }
}

fn retryable(kind: io::ErrorKind) -> bool {
    matches!(kind, io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

/// Read exactly `buf.len()` bytes, observing the cancellation token between
/// chunks. Reads that time out are retried so a blocked socket with a read
/// timeout still honors cancellation promptly.
fn fill_exact(
    source: &mut dyn Read,
    cancel: &CancellationToken,
    counter: &mut ByteCounter,
    buf: &mut [u8],
) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        if cancel.is_cancelled() {
            return Err(WireError::Cancelled);
        }
        match source.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(WireError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    constants::ERR_EOF_IN_FRAME,
                )))
            }
            Ok(n) => {
                filled += n;
                counter.add_read(n);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if retryable(e.kind()) => std::thread::sleep(RETRY_DELAY),
            Err(e) => return Err(WireError::Io(e)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormatViolation;
    use std::io::Cursor;

    fn written(write: impl FnOnce(&mut WireStream<'_>)) -> Vec<u8> {
        let mut out = Vec::new();
        let mut stream = WireStream::writer(&mut out);
        write(&mut stream);
        out
    }

    #[test]
    fn integers_are_little_endian() {
        let out = written(|s| {
            s.read_write_u32(&mut 0x0102_0304u32).unwrap();
        });
        assert_eq!(out, [0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn port_is_big_endian() {
        let out = written(|s| {
            s.read_write_u16_be(&mut 8333u16).unwrap();
        });
        assert_eq!(out, [0x20, 0x8D]);
    }

    #[test]
    fn varint_boundary_encodings() {
        assert_eq!(written(|s| s.read_write_varint(&mut 0xFC).unwrap()), [0xFC]);
        assert_eq!(
            written(|s| s.read_write_varint(&mut 0xFD).unwrap()),
            [0xFD, 0xFD, 0x00]
        );
        assert_eq!(
            written(|s| s.read_write_varint(&mut 0x1_0000).unwrap()),
            [0xFE, 0x00, 0x00, 0x01, 0x00]
        );
        assert_eq!(
            written(|s| s.read_write_varint(&mut 0x1_0000_0000).unwrap()),
            [0xFF, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn varint_roundtrip() {
        for value in [0u64, 1, 0xFC, 0xFD, 0xFFFF, 0x1_0000, 0xFFFF_FFFF, u64::MAX] {
            let mut input = value;
            let encoded = written(|s| s.read_write_varint(&mut input).unwrap());
            let mut cursor = Cursor::new(encoded);
            let mut stream = WireStream::reader(&mut cursor);
            let mut decoded = 0u64;
            stream.read_write_varint(&mut decoded).unwrap();
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn varint_rejects_non_canonical() {
        // 0x10 fits in one byte but is carried in the 0xFD form
        let mut cursor = Cursor::new(vec![0xFD, 0x10, 0x00]);
        let mut stream = WireStream::reader(&mut cursor);
        let mut value = 0u64;
        let err = stream.read_write_varint(&mut value).unwrap_err();
        assert!(matches!(
            err,
            WireError::Format(FormatViolation::NonCanonicalVarint(0x10))
        ));
    }

    #[test]
    fn var_bytes_rejects_oversized_length_before_reading() {
        // Declared length far beyond the ceiling, but only the prefix is present
        let mut cursor = Cursor::new(vec![0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F]);
        let mut stream = WireStream::reader(&mut cursor);
        let mut bytes = Vec::new();
        let err = stream.read_write_var_bytes(&mut bytes).unwrap_err();
        assert!(matches!(
            err,
            WireError::Format(FormatViolation::OversizedPayload { .. })
        ));
        assert!(bytes.is_empty());
    }

    #[test]
    fn var_string_roundtrip() {
        let encoded = written(|s| {
            s.read_write_var_string(&mut String::from("/p2p-wire:0.1.0/")).unwrap();
        });
        let mut cursor = Cursor::new(encoded);
        let mut stream = WireStream::reader(&mut cursor);
        let mut decoded = String::new();
        stream.read_write_var_string(&mut decoded).unwrap();
        assert_eq!(decoded, "/p2p-wire:0.1.0/");
    }

    #[test]
    fn var_string_rejects_invalid_utf8() {
        let mut cursor = Cursor::new(vec![0x02, 0xFF, 0xFE]);
        let mut stream = WireStream::reader(&mut cursor);
        let mut decoded = String::new();
        let err = stream.read_write_var_string(&mut decoded).unwrap_err();
        assert!(matches!(
            err,
            WireError::Format(FormatViolation::InvalidString)
        ));
    }

    #[test]
    fn trailing_optionals_absent_at_clean_eof() {
        let mut cursor = Cursor::new(Vec::new());
        let mut stream = WireStream::reader(&mut cursor);
        let mut relay = Some(true);
        stream.read_write_bool_opt(&mut relay).unwrap();
        assert_eq!(relay, None);

        let mut cursor = Cursor::new(vec![0x01]);
        let mut stream = WireStream::reader(&mut cursor);
        let mut relay = None;
        stream.read_write_bool_opt(&mut relay).unwrap();
        assert_eq!(relay, Some(true));
    }

    #[test]
    fn truncated_optional_u64_is_an_error() {
        // Four bytes of an eight-byte field: truncation, not a clean absence
        let mut cursor = Cursor::new(vec![0x01, 0x02, 0x03, 0x04]);
        let mut stream = WireStream::reader(&mut cursor);
        let mut nonce = None;
        let err = stream.read_write_u64_opt(&mut nonce).unwrap_err();
        assert!(matches!(err, WireError::Io(_)));
    }

    #[test]
    fn counter_tracks_both_directions() {
        let mut out = Vec::new();
        let mut stream = WireStream::writer(&mut out);
        stream.read_write_u32(&mut 7u32).unwrap();
        stream.read_write_u8(&mut 1u8).unwrap();
        assert_eq!(stream.counter().bytes_written(), 5);
        assert_eq!(stream.counter().bytes_read(), 0);

        let mut cursor = Cursor::new(out);
        let mut stream = WireStream::reader(&mut cursor);
        let mut value = 0u32;
        stream.read_write_u32(&mut value).unwrap();
        assert_eq!(stream.counter().bytes_read(), 4);
    }

    #[test]
    fn cancelled_token_aborts_reads() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut cursor = Cursor::new(vec![0u8; 16]);
        let mut stream = WireStream::reader(&mut cursor).with_cancel(cancel);
        let mut value = 0u32;
        let err = stream.read_write_u32(&mut value).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn derived_context_inherits_version_and_token() {
        let cancel = CancellationToken::new();
        let mut out = Vec::new();
        let stream = WireStream::writer(&mut out)
            .with_version(70001)
            .with_cancel(cancel.clone());

        let mut body = Cursor::new(vec![0x2A, 0x00, 0x00, 0x00]);
        let mut child = stream.derive(&mut body);
        assert_eq!(child.protocol_version(), 70001);
        assert!(!child.is_serializing());

        let mut value = 0u32;
        child.read_write_u32(&mut value).unwrap();
        assert_eq!(value, 42);

        cancel.cancel();
        let mut more = 0u8;
        assert!(child.read_write_u8(&mut more).unwrap_err().is_cancelled());
    }

    #[test]
    fn read_to_end_on_writer_is_a_usage_error() {
        let mut out = Vec::new();
        let mut stream = WireStream::writer(&mut out);
        let mut buf = Vec::new();
        assert!(matches!(
            stream.read_to_end(&mut buf).unwrap_err(),
            WireError::Usage(_)
        ));
    }
}
