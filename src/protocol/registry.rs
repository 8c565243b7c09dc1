//! # Payload Registry
//!
//! Command-to-constructor routing for payload dispatch.
//!
//! The registry maps each [`Command`] to a plain function that constructs
//! an empty payload of the right variant; the codec then parses the frame
//! body into it. Registration happens once through the builder and the
//! resulting table is immutable, so lookups are lock-free and the set of
//! known commands cannot drift at runtime.
//!
//! Lookup is total: commands with no entry resolve to the fallback
//! constructor, which produces the raw-bytes [`Payload::Unknown`] variant.

use crate::protocol::command::Command;
use crate::protocol::payload::{
    Payload, PingPayload, PongPayload, UnknownPayload, VersionPayload,
};
use std::collections::HashMap;

/// Constructor for an empty payload of one variant.
pub type PayloadCtor = fn() -> Payload;

/// Immutable command-to-constructor table.
#[derive(Debug, Clone)]
pub struct PayloadRegistry {
    entries: HashMap<Command, PayloadCtor>,
}

/// Accumulates registrations before the table is frozen.
#[derive(Debug, Default)]
pub struct PayloadRegistryBuilder {
    entries: HashMap<Command, PayloadCtor>,
}

impl PayloadRegistryBuilder {
    /// Register a payload constructor. The key is taken from the command of
    /// the payload the constructor builds, so registration and lookup can
    /// never disagree. A later registration for the same command replaces
    /// the earlier one.
    #[must_use]
    pub fn register(mut self, ctor: PayloadCtor) -> Self {
        let command = ctor().command();
        self.entries.insert(command, ctor);
        self
    }

    /// Freeze the table.
    pub fn build(self) -> PayloadRegistry {
        PayloadRegistry {
            entries: self.entries,
        }
    }
}

impl PayloadRegistry {
    /// Start an empty registration.
    pub fn builder() -> PayloadRegistryBuilder {
        PayloadRegistryBuilder::default()
    }

    /// A registry with no entries: every command resolves to the fallback.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Look up the constructor for `command`. Unregistered commands get the
    /// fallback constructor; the codec stamps the actual command onto the
    /// resulting payload.
    pub fn resolve(&self, command: Command) -> PayloadCtor {
        self.entries.get(&command).copied().unwrap_or(unknown)
    }

    /// Whether `command` has a typed payload registered.
    pub fn contains(&self, command: Command) -> bool {
        self.entries.contains_key(&command)
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered commands, in no particular order.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.entries.keys()
    }
}

impl Default for PayloadRegistry {
    /// The baseline handshake-level set: `version`, `verack`, `ping`,
    /// `pong`, `getaddr`.
    fn default() -> Self {
        Self::builder()
            .register(version)
            .register(verack)
            .register(ping)
            .register(pong)
            .register(getaddr)
            .build()
    }
}

fn version() -> Payload {
    Payload::Version(VersionPayload::default())
}

fn verack() -> Payload {
    Payload::Verack
}

fn ping() -> Payload {
    Payload::Ping(PingPayload::default())
}

fn pong() -> Payload {
    Payload::Pong(PongPayload::default())
}

fn getaddr() -> Payload {
    Payload::GetAddr
}

fn unknown() -> Payload {
    Payload::Unknown(UnknownPayload::default())
}
