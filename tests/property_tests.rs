//! Property-based tests using proptest
//!
//! These validate frame invariants across randomly generated commands,
//! payload bytes, and stream corruption.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use p2p_wire::core::stream::WireStream;
use p2p_wire::protocol::command::Command;
use p2p_wire::protocol::payload::{Payload, PingPayload, UnknownPayload, VersionPayload};
use p2p_wire::transport::{read_message, write_message};
use p2p_wire::{Message, PayloadRegistry, WireConfig};
use proptest::prelude::*;
use std::io::Cursor;

// Property: any command and payload bytes survive a full frame round trip
proptest! {
    #[test]
    fn prop_unknown_frame_roundtrip(
        name in "[a-z]{1,12}",
        data in prop::collection::vec(any::<u8>(), 0..2048),
    ) {
        let config = WireConfig::default();
        let registry = PayloadRegistry::empty();
        let mut scratch = Vec::new();

        let command = Command::new(&name).expect("Generated command should be valid");
        let mut outgoing = Message::new(
            config.magic,
            Payload::Unknown(UnknownPayload::new(command, data.clone())),
        );
        let mut wire = Vec::new();
        write_message(&mut wire, &mut outgoing, &config, &registry, &mut scratch)
            .expect("Serialization should not fail");

        let mut cursor = Cursor::new(wire);
        let decoded = read_message(&mut cursor, &config, &registry, &mut scratch)
            .expect("Deserialization should not fail");
        prop_assert_eq!(decoded.command(), command);
        match decoded.payload() {
            Some(Payload::Unknown(body)) => prop_assert_eq!(&body.data, &data),
            other => prop_assert!(false, "unexpected payload {:?}", other),
        }
    }
}

// Property: frame serialization is deterministic
proptest! {
    #[test]
    fn prop_frame_serialization_deterministic(
        data in prop::collection::vec(any::<u8>(), 0..512),
    ) {
        let config = WireConfig::default();
        let registry = PayloadRegistry::default();
        let mut scratch = Vec::new();

        let payload = Payload::Unknown(UnknownPayload::new(
            Command::new("inv").expect("Valid command"),
            data,
        ));
        let mut message = Message::new(config.magic, payload);

        let mut first = Vec::new();
        write_message(&mut first, &mut message, &config, &registry, &mut scratch)
            .expect("Serialization should not fail");
        let mut second = Vec::new();
        write_message(&mut second, &mut message, &config, &registry, &mut scratch)
            .expect("Serialization should not fail");
        prop_assert_eq!(first, second);
    }
}

// Property: a frame is recovered after any garbage prefix that does not
// itself contain the magic
proptest! {
    #[test]
    fn prop_resync_skips_magicless_garbage(
        garbage in prop::collection::vec(any::<u8>(), 0..512),
        nonce in any::<u64>(),
    ) {
        let config = WireConfig::default();
        let registry = PayloadRegistry::default();
        let mut scratch = Vec::new();

        let magic = config.magic.to_le_bytes();
        prop_assume!(!garbage.windows(magic.len()).any(|w| w == magic));

        let mut wire = garbage;
        let mut message = Message::new(
            config.magic,
            Payload::Ping(PingPayload { nonce: Some(nonce) }),
        );
        write_message(&mut wire, &mut message, &config, &registry, &mut scratch)
            .expect("Serialization should not fail");

        let mut cursor = Cursor::new(wire);
        let decoded = read_message(&mut cursor, &config, &registry, &mut scratch)
            .expect("Reader should realign past garbage");
        prop_assert_eq!(decoded.command(), Command::PING);
        prop_assert_eq!(
            decoded.payload(),
            Some(&Payload::Ping(PingPayload { nonce: Some(nonce) }))
        );
    }
}

// Property: varint encodings are minimal-width and round-trip exactly
proptest! {
    #[test]
    fn prop_varint_roundtrip_canonical(value in any::<u64>()) {
        let mut encoded = Vec::new();
        {
            let mut writer = WireStream::writer(&mut encoded);
            let mut outgoing = value;
            writer
                .read_write_varint(&mut outgoing)
                .expect("Varint write should not fail");
        }

        let expected_len = match value {
            0..=0xFC => 1,
            0xFD..=0xFFFF => 3,
            0x1_0000..=0xFFFF_FFFF => 5,
            _ => 9,
        };
        prop_assert_eq!(encoded.len(), expected_len);

        let mut cursor = Cursor::new(encoded);
        let mut reader = WireStream::reader(&mut cursor);
        let mut decoded = 0u64;
        reader
            .read_write_varint(&mut decoded)
            .expect("Varint read should not fail");
        prop_assert_eq!(decoded, value);
    }
}

// Property: arbitrary noise never panics the reader; it fails or decodes
proptest! {
    #[test]
    fn prop_reader_never_panics_on_noise(
        noise in prop::collection::vec(any::<u8>(), 0..4096),
    ) {
        let config = WireConfig::default();
        let registry = PayloadRegistry::default();
        let mut scratch = Vec::new();
        let mut cursor = Cursor::new(noise);
        let _ = read_message(&mut cursor, &config, &registry, &mut scratch);
    }
}

// Property: command construction and wire validation agree on the full
// graphic-ASCII range
proptest! {
    #[test]
    fn prop_command_construction_matches_wire_validation(name in "[!-~]{1,12}") {
        let command = Command::new(&name).expect("Graphic ASCII within 12 bytes is valid");
        prop_assert_eq!(command.as_str(), name.as_str());
        let reparsed =
            Command::from_wire(*command.as_bytes()).expect("Wire field should validate");
        prop_assert_eq!(reparsed, command);
    }
}

// Property: user agents of any content survive the version payload
proptest! {
    #[test]
    fn prop_user_agent_of_any_content_roundtrips(agent in "\\PC{0,64}") {
        let config = WireConfig::default();
        let registry = PayloadRegistry::default();
        let mut scratch = Vec::new();

        let body = VersionPayload {
            user_agent: agent.clone(),
            relay: Some(true),
            ..VersionPayload::default()
        };
        let mut message = Message::new(config.magic, Payload::Version(body));

        let mut wire = Vec::new();
        write_message(&mut wire, &mut message, &config, &registry, &mut scratch)
            .expect("Serialization should not fail");
        let mut cursor = Cursor::new(wire);
        let decoded = read_message(&mut cursor, &config, &registry, &mut scratch)
            .expect("Deserialization should not fail");
        match decoded.payload() {
            Some(Payload::Version(body)) => prop_assert_eq!(&body.user_agent, &agent),
            other => prop_assert!(false, "unexpected payload {:?}", other),
        }
    }
}
