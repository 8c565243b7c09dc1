//! # Payload Checksum
//!
//! Double-SHA256 integrity check carried in the frame header.
//!
//! The checksum field is the first four bytes of `SHA256(SHA256(payload))`,
//! interpreted as a little-endian `u32`. It is present only when the
//! protocol version is at or above the checksum gate (see
//! [`crate::config::CHECKSUM_VERSION`]).

use sha2::{Digest, Sha256};

/// Compute the double-SHA256 digest of `data`.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let first: [u8; 32] = hasher.finalize().into();

    let mut hasher = Sha256::new();
    hasher.update(first);
    hasher.finalize().into()
}

/// Compute the frame checksum of `data`: the low 32 bits of its
/// double-SHA256 digest.
pub fn checksum_of(data: &[u8]) -> u32 {
    let digest = sha256d(data);
    u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
}
