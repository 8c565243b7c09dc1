//! # Magic Locator
//!
//! Byte-wise scan that realigns a reader to the next frame boundary.
//!
//! After a malformed frame the stream position is somewhere inside
//! unstructured bytes; the scan consumes input up to and including the
//! next occurrence of the network magic, after which the frame codec can
//! take over with its magic field skipped.

use crate::error::{FormatViolation, Result, WireError};
use std::io::{self, Read};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const RETRY_DELAY: Duration = Duration::from_millis(1);

/// Consume bytes from `source` until the little-endian encoding of `magic`
/// has been read in full.
///
/// A mismatched byte restarts the match, counting it as the new first byte
/// when it equals the magic's first byte. End of input before a complete
/// match reports [`FormatViolation::MagicNotFound`]; cancellation is
/// observed between reads.
pub fn read_magic(
    source: &mut dyn Read,
    magic: u32,
    cancel: &CancellationToken,
) -> Result<()> {
    let target = magic.to_le_bytes();
    let mut matched = 0;
    let mut skipped = 0u64;
    let mut byte = [0u8; 1];

    while matched < target.len() {
        if cancel.is_cancelled() {
            return Err(WireError::Cancelled);
        }
        match source.read(&mut byte) {
            Ok(0) => return Err(FormatViolation::MagicNotFound.into()),
            Ok(_) => {
                if byte[0] == target[matched] {
                    matched += 1;
                } else if byte[0] == target[0] {
                    skipped += matched as u64;
                    matched = 1;
                } else {
                    skipped += matched as u64 + 1;
                    matched = 0;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::TimedOut =>
            {
                std::thread::sleep(RETRY_DELAY);
            }
            Err(e) => return Err(WireError::Io(e)),
        }
    }

    if skipped > 0 {
        debug!(skipped, "resynchronized to magic");
    }
    Ok(())
}
