#![no_main]

use libfuzzer_sys::fuzz_target;
use p2p_wire::transport::read_message;
use p2p_wire::{PayloadRegistry, WireConfig};
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    // Fuzz frame deserialization - test for panics, crashes, infinite loops
    let config = WireConfig::default();
    let registry = PayloadRegistry::default();
    let mut scratch = Vec::new();
    let mut cursor = Cursor::new(data);
    let _ = read_message(&mut cursor, &config, &registry, &mut scratch);
});
