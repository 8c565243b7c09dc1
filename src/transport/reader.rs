//! # Byte-Stream Entry Points
//!
//! Thin orchestration for reading and writing whole messages on a
//! blocking byte stream: locate the frame boundary, run the codec, return
//! the message. Policy (peer scoring, disconnects, retries) stays with the
//! caller.
//!
//! The scan and the reads observe a cancellation token, so a stream with a
//! read timeout can be shut down promptly. Wrap raw sockets in a
//! `BufReader`; the magic scan reads byte-wise.

use crate::config::WireConfig;
use crate::core::message::{Message, SkipMagicScope};
use crate::core::stream::{ByteCounter, WireStream};
use crate::error::Result;
use crate::protocol::registry::PayloadRegistry;
use crate::transport::resync;
use std::io::{Read, Write};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Read the next message from `source`, resynchronizing past any garbage
/// before the frame.
pub fn read_message(
    source: &mut dyn Read,
    config: &WireConfig,
    registry: &PayloadRegistry,
    scratch: &mut Vec<u8>,
) -> Result<Message> {
    let (message, _) = read_message_with_counter(
        source,
        config,
        registry,
        &CancellationToken::new(),
        scratch,
    )?;
    Ok(message)
}

/// [`read_message`] with a cancellation token observed throughout the scan
/// and the frame reads.
pub fn read_message_cancellable(
    source: &mut dyn Read,
    config: &WireConfig,
    registry: &PayloadRegistry,
    cancel: &CancellationToken,
    scratch: &mut Vec<u8>,
) -> Result<Message> {
    let (message, _) = read_message_with_counter(source, config, registry, cancel, scratch)?;
    Ok(message)
}

/// Full form: also returns the byte counter for the frame reads. The
/// counter covers the command field onward; the four magic bytes are
/// consumed by the scan.
#[instrument(skip_all, fields(magic = config.magic))]
pub fn read_message_with_counter(
    source: &mut dyn Read,
    config: &WireConfig,
    registry: &PayloadRegistry,
    cancel: &CancellationToken,
    scratch: &mut Vec<u8>,
) -> Result<(Message, ByteCounter)> {
    resync::read_magic(source, config.magic, cancel)?;

    let mut stream = WireStream::reader(source)
        .with_version(config.protocol_version)
        .with_cancel(cancel.clone());
    let mut message = Message::empty(config.magic);
    {
        let mut scoped = SkipMagicScope::new(&mut message);
        scoped.read_write(&mut stream, config, registry, scratch)?;
    }

    let counter = stream.counter();
    debug!(
        command = %message.command(),
        bytes = counter.bytes_read(),
        "read message"
    );
    Ok((message, counter))
}

/// Write one message to `sink`. The message's payload must be assigned.
#[instrument(skip_all, fields(magic = config.magic))]
pub fn write_message(
    sink: &mut dyn Write,
    message: &mut Message,
    config: &WireConfig,
    registry: &PayloadRegistry,
    scratch: &mut Vec<u8>,
) -> Result<()> {
    let mut stream = WireStream::writer(sink).with_version(config.protocol_version);
    message.read_write(&mut stream, config, registry, scratch)?;
    debug!(
        command = %message.command(),
        bytes = stream.counter().bytes_written(),
        "wrote message"
    );
    Ok(())
}
