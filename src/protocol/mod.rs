//! # Protocol Vocabulary
//!
//! Commands, typed payloads, and the registry that binds them.
//!
//! ## Components
//! - **Command**: Validated 12-byte command identifiers
//! - **Payload**: The typed payload variants plus the raw-bytes fallback
//! - **Registry**: Immutable command-to-constructor dispatch table

pub mod command;
pub mod payload;
pub mod registry;

pub use command::Command;
pub use payload::Payload;
pub use registry::PayloadRegistry;
