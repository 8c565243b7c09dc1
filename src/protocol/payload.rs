//! # Typed Payloads
//!
//! The payload variants this crate ships, plus the lossless fallback for
//! commands it does not recognize.
//!
//! Every payload body is written and parsed through the same `read_write`
//! method against a [`WireStream`], so the field order is stated exactly
//! once per type. The codec hands payload bodies a *derived* context
//! carrying the frame's protocol version, which is what version-gated
//! fields (such as the `version` message's relay flag) consult.
//!
//! ## Variants
//! - **Version**: handshake opener with peer addresses and user agent
//! - **Verack**: empty acknowledgement
//! - **Ping / Pong**: liveness probes, nonce optional on ping for very old
//!   peers
//! - **GetAddr**: empty address-book request
//! - **Unknown**: raw bytes of an unrecognized command, round-trips
//!   byte-for-byte

use crate::config::RELAY_VERSION;
use crate::core::stream::WireStream;
use crate::error::Result;
use crate::protocol::command::Command;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};

/// Network address as embedded in a `version` payload: service bits, raw
/// IPv6 (or IPv4-mapped) bytes, and a big-endian port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetAddr {
    pub services: u64,
    pub ip: [u8; 16],
    pub port: u16,
}

impl NetAddr {
    pub fn from_socket_addr(addr: SocketAddr, services: u64) -> Self {
        let ip = match addr.ip() {
            IpAddr::V4(v4) => v4.to_ipv6_mapped().octets(),
            IpAddr::V6(v6) => v6.octets(),
        };
        Self {
            services,
            ip,
            port: addr.port(),
        }
    }

    /// Recover the socket address, unmapping IPv4-in-IPv6 forms.
    pub fn socket_addr(&self) -> SocketAddr {
        let v6 = Ipv6Addr::from(self.ip);
        match v6.to_ipv4_mapped() {
            Some(v4) => SocketAddr::new(IpAddr::V4(v4), self.port),
            None => SocketAddr::new(IpAddr::V6(v6), self.port),
        }
    }

    pub fn read_write(&mut self, stream: &mut WireStream<'_>) -> Result<()> {
        stream.read_write_u64(&mut self.services)?;
        stream.read_write_bytes(&mut self.ip)?;
        stream.read_write_u16_be(&mut self.port)
    }
}

/// Body of the `version` message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionPayload {
    pub version: u32,
    pub services: u64,
    pub timestamp: i64,
    pub receiver: NetAddr,
    pub sender: NetAddr,
    pub nonce: u64,
    pub user_agent: String,
    pub start_height: i32,
    /// BIP37 relay flag; trailing and optional, absent from old peers
    pub relay: Option<bool>,
}

impl VersionPayload {
    pub fn read_write(&mut self, stream: &mut WireStream<'_>) -> Result<()> {
        stream.read_write_u32(&mut self.version)?;
        stream.read_write_u64(&mut self.services)?;
        stream.read_write_i64(&mut self.timestamp)?;
        self.receiver.read_write(stream)?;
        self.sender.read_write(stream)?;
        stream.read_write_u64(&mut self.nonce)?;
        stream.read_write_var_string(&mut self.user_agent)?;
        stream.read_write_i32(&mut self.start_height)?;
        // The relay flag only exists on BIP37-capable streams
        if stream.protocol_version() >= RELAY_VERSION {
            stream.read_write_bool_opt(&mut self.relay)?;
        }
        Ok(())
    }
}

/// Body of the `ping` message. Peers older than BIP31 send an empty ping,
/// so the nonce is a trailing optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PingPayload {
    pub nonce: Option<u64>,
}

impl PingPayload {
    pub fn read_write(&mut self, stream: &mut WireStream<'_>) -> Result<()> {
        stream.read_write_u64_opt(&mut self.nonce)
    }
}

/// Body of the `pong` message, echoing the ping nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PongPayload {
    pub nonce: u64,
}

impl PongPayload {
    pub fn read_write(&mut self, stream: &mut WireStream<'_>) -> Result<()> {
        stream.read_write_u64(&mut self.nonce)
    }
}

/// Raw body of a command this crate has no typed variant for. Reading
/// slurps the whole frame payload; writing emits it verbatim, so unknown
/// messages survive a decode/encode cycle untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPayload {
    pub command: Command,
    pub data: Vec<u8>,
}

impl UnknownPayload {
    pub fn new(command: Command, data: Vec<u8>) -> Self {
        Self { command, data }
    }

    pub fn read_write(&mut self, stream: &mut WireStream<'_>) -> Result<()> {
        if stream.is_serializing() {
            stream.read_write_bytes(&mut self.data)
        } else {
            self.data.clear();
            stream.read_to_end(&mut self.data)
        }
    }
}

impl Default for UnknownPayload {
    fn default() -> Self {
        Self {
            command: Command::EMPTY,
            data: Vec::new(),
        }
    }
}

/// A typed protocol payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Version(VersionPayload),
    Verack,
    Ping(PingPayload),
    Pong(PongPayload),
    GetAddr,
    Unknown(UnknownPayload),
}

impl Payload {
    /// The wire command identifying this payload.
    pub fn command(&self) -> Command {
        match self {
            Payload::Version(_) => Command::VERSION,
            Payload::Verack => Command::VERACK,
            Payload::Ping(_) => Command::PING,
            Payload::Pong(_) => Command::PONG,
            Payload::GetAddr => Command::GETADDR,
            Payload::Unknown(body) => body.command,
        }
    }

    /// Serialize or parse the payload body against `stream`.
    pub fn read_write(&mut self, stream: &mut WireStream<'_>) -> Result<()> {
        match self {
            Payload::Version(body) => body.read_write(stream),
            Payload::Verack | Payload::GetAddr => Ok(()),
            Payload::Ping(body) => body.read_write(stream),
            Payload::Pong(body) => body.read_write(stream),
            Payload::Unknown(body) => body.read_write(stream),
        }
    }

    /// True for the fallback variant holding an unrecognized command.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Payload::Unknown(_))
    }
}
