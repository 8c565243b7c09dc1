#![no_main]

use libfuzzer_sys::fuzz_target;
use p2p_wire::transport::{read_message, write_message};
use p2p_wire::{PayloadRegistry, WireConfig};
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    // Any input that decodes must re-encode, and the re-encoded frame must
    // decode to the same message
    let config = WireConfig::default();
    let registry = PayloadRegistry::default();
    let mut scratch = Vec::new();

    let mut cursor = Cursor::new(data);
    if let Ok(mut message) = read_message(&mut cursor, &config, &registry, &mut scratch) {
        let mut wire = Vec::new();
        write_message(&mut wire, &mut message, &config, &registry, &mut scratch)
            .expect("Decoded message must re-encode");

        let mut cursor = Cursor::new(wire.as_slice());
        let again = read_message(&mut cursor, &config, &registry, &mut scratch)
            .expect("Re-encoded frame must decode");
        assert_eq!(again, message);
    }
});
