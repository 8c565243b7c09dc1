//! # Core Codec Components
//!
//! Low-level frame handling, the serialization context, and checksums.
//!
//! This module provides the foundation of the crate: the bidirectional
//! serialization context, the message frame state machine, and the tokio
//! codec adapter over it.
//!
//! ## Components
//! - **Stream**: Directional serialization context with version,
//!   cancellation, and byte accounting
//! - **Message**: Frame state machine with header validation and payload
//!   dispatch
//! - **Checksum**: Double-SHA256 payload integrity
//! - **Codec**: Tokio codec for framing over async byte streams
//!
//! ## Wire Format
//! ```text
//! [Magic(4)] [Command(12)] [Length(4)] [Checksum(4)?] [Payload(N)]
//! ```
//!
//! ## Security
//! - Maximum payload size: 32MB (prevents memory exhaustion)
//! - Magic bytes prevent accidental misinterpretation
//! - Length validation before allocation
//! - Checksum verification before payload parsing

pub mod checksum;
pub mod codec;
pub mod message;
pub mod stream;
