//! # Transport Entry Points
//!
//! Whole-message reads and writes over blocking byte streams, plus the
//! magic-locator scan used to recover frame alignment. Connection
//! acquisition and lifecycle stay with the caller; for async streams use
//! [`crate::core::codec::FrameCodec`] with `tokio_util::codec::Framed`.

pub mod reader;
pub mod resync;

pub use reader::{read_message, read_message_cancellable, read_message_with_counter, write_message};
pub use resync::read_magic;
