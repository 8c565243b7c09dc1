#![no_main]

use libfuzzer_sys::fuzz_target;
use p2p_wire::protocol::command::Command;

fuzz_target!(|data: &[u8]| {
    // Fuzz command field validation
    if data.len() < 12 {
        return;
    }
    let mut field = [0u8; 12];
    field.copy_from_slice(&data[..12]);

    if let Ok(command) = Command::from_wire(field) {
        // Accepted fields expose a printable name that rebuilds to the
        // same wire encoding
        let name = command.as_str();
        assert!(name.len() <= 12);
        let rebuilt = Command::new(name).expect("Accepted command name must rebuild");
        assert_eq!(rebuilt, command);
    }
});
