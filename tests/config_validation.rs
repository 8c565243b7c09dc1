//! Integration tests for configuration loading and validation

#![allow(clippy::unwrap_used, clippy::expect_used)]

use p2p_wire::config::{
    CHECKSUM_VERSION, MAINNET_MAGIC, MAX_PAYLOAD_LEN, REGTEST_MAGIC, TESTNET3_MAGIC,
};
use p2p_wire::{WireConfig, WireError};

#[test]
fn test_default_config_validates() {
    let config = WireConfig::default();
    let errors = config.validate();
    assert!(
        errors.is_empty(),
        "Default config should be valid, but got errors: {:?}",
        errors
    );
}

#[test]
fn test_network_presets_validate() {
    for config in [
        WireConfig::mainnet(),
        WireConfig::testnet(),
        WireConfig::regtest(),
    ] {
        assert!(config.validate_strict().is_ok());
    }
}

#[test]
fn test_zero_magic_flagged() {
    let config = WireConfig::default_with_overrides(|c| c.magic = 0);
    let errors = config.validate();
    assert!(!errors.is_empty(), "Should have validation errors");
    assert!(errors.iter().any(|e| e.contains("magic")));
}

#[test]
fn test_zero_payload_ceiling_flagged() {
    let config = WireConfig::default_with_overrides(|c| c.max_payload_len = 0);
    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("Max payload length must be greater than 0")));
}

#[test]
fn test_excessive_payload_ceiling_flagged() {
    let config = WireConfig::default_with_overrides(|c| c.max_payload_len = MAX_PAYLOAD_LEN * 2);
    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("very high")));
}

#[test]
fn test_protocol_version_below_checksum_gate_flagged() {
    let config =
        WireConfig::default_with_overrides(|c| c.protocol_version = CHECKSUM_VERSION - 1);
    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("checksum gate")));
}

#[test]
fn test_validate_strict_aggregates_all_errors() {
    let config = WireConfig::default_with_overrides(|c| {
        c.magic = 0;
        c.max_payload_len = 0;
    });
    assert_eq!(config.validate().len(), 2);

    let err = config.validate_strict().unwrap_err();
    let text = err.to_string();
    assert!(text.contains("magic"));
    assert!(text.contains("Max payload length"));
}

#[test]
fn test_full_toml_parses() {
    let config = WireConfig::from_toml(
        r#"
magic = 0x0709110B
protocol_version = 70011
checksum_version = 60002
max_payload_len = 1048576
"#,
    )
    .expect("Full TOML config should parse");

    assert_eq!(config.magic, TESTNET3_MAGIC);
    assert_eq!(config.protocol_version, 70_011);
    assert_eq!(config.checksum_version, 60_002);
    assert_eq!(config.max_payload_len, 1_048_576);
}

#[test]
fn test_empty_toml_is_all_defaults() {
    let config = WireConfig::from_toml("").expect("Empty TOML should yield defaults");
    assert_eq!(config, WireConfig::default());
}

#[test]
fn test_malformed_toml_reports_config_error() {
    let err = WireConfig::from_toml("magic = ").unwrap_err();
    match err {
        WireError::ConfigError(text) => assert!(text.contains("Failed to parse TOML")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_wrong_field_type_rejected() {
    assert!(WireConfig::from_toml("magic = \"mainnet\"").is_err());
}

#[test]
fn test_missing_file_reports_config_error() {
    let err = WireConfig::from_file("/nonexistent/p2p-wire.toml").unwrap_err();
    match err {
        WireError::ConfigError(text) => assert!(text.contains("Failed to open")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_save_and_reload() {
    let path = std::env::temp_dir().join(format!("p2p-wire-config-{}.toml", std::process::id()));
    let config = WireConfig::default_with_overrides(|c| c.magic = REGTEST_MAGIC);

    config.save_to_file(&path).expect("Save should succeed");
    let reloaded = WireConfig::from_file(&path).expect("Reload should succeed");
    assert_eq!(reloaded, config);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_example_config_is_loadable() {
    let example = WireConfig::example_config();
    let parsed = WireConfig::from_toml(&example).expect("Example config should parse");
    assert_eq!(parsed, WireConfig::default());
    assert_eq!(parsed.magic, MAINNET_MAGIC);
}

#[test]
fn test_env_overrides_apply() {
    std::env::set_var("P2P_WIRE_MAGIC", "0x0709110B");
    std::env::set_var("P2P_WIRE_PROTOCOL_VERSION", "70001");
    std::env::set_var("P2P_WIRE_CHECKSUM_VERSION", "60001");
    std::env::set_var("P2P_WIRE_MAX_PAYLOAD_LEN", "1048576");

    let config = WireConfig::from_env().expect("Env config should load");
    assert_eq!(config.magic, TESTNET3_MAGIC);
    assert_eq!(config.protocol_version, 70_001);
    assert_eq!(config.checksum_version, 60_001);
    assert_eq!(config.max_payload_len, 1_048_576);

    std::env::set_var("P2P_WIRE_MAGIC", "not-hex");
    assert!(matches!(
        WireConfig::from_env(),
        Err(WireError::ConfigError(_))
    ));

    std::env::remove_var("P2P_WIRE_MAGIC");
    std::env::remove_var("P2P_WIRE_PROTOCOL_VERSION");
    std::env::remove_var("P2P_WIRE_CHECKSUM_VERSION");
    std::env::remove_var("P2P_WIRE_MAX_PAYLOAD_LEN");
}
