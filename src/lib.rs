//! # p2p-wire
//!
//! Message framing codec for Bitcoin-family peer-to-peer network protocols.
//!
//! The crate converts between raw byte streams and structured protocol
//! messages: it frames payloads with the network magic, command, length,
//! and (version-gated) double-SHA256 checksum, validates incoming frames
//! strictly before allocating or parsing, and dispatches payload bytes to
//! typed variants through an immutable registry. Commands without a typed
//! variant fall back to a raw-bytes payload that round-trips losslessly.
//!
//! ## Layers
//! - [`core::stream`]: the directional serialization context
//! - [`core::message`]: the frame state machine
//! - [`core::codec`]: tokio codec adapter for async streams
//! - [`protocol`]: commands, payloads, and the dispatch registry
//! - [`transport`]: whole-message entry points for blocking streams
//!
//! ## Example
//! ```rust
//! use p2p_wire::protocol::payload::PingPayload;
//! use p2p_wire::{Message, Payload, PayloadRegistry, WireConfig};
//!
//! # fn main() -> p2p_wire::error::Result<()> {
//! let config = WireConfig::mainnet();
//! let registry = PayloadRegistry::default();
//! let mut scratch = Vec::new();
//!
//! // Encode a ping
//! let payload = Payload::Ping(PingPayload { nonce: Some(7) });
//! let mut message = Message::new(config.magic, payload);
//! let mut wire = Vec::new();
//! p2p_wire::transport::write_message(&mut wire, &mut message, &config, &registry, &mut scratch)?;
//!
//! // Decode it back
//! let mut source = std::io::Cursor::new(wire);
//! let decoded = p2p_wire::transport::read_message(&mut source, &config, &registry, &mut scratch)?;
//! assert_eq!(decoded.payload(), message.payload());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod transport;

pub use crate::config::WireConfig;
pub use crate::core::codec::FrameCodec;
pub use crate::core::message::{Message, SkipMagicScope};
pub use crate::core::stream::{ByteCounter, WireStream};
pub use crate::error::{Result, WireError};
pub use crate::protocol::{Command, Payload, PayloadRegistry};
