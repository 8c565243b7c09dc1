//! # Configuration Management
//!
//! Centralized configuration for the wire codec.
//!
//! This module provides the protocol constants (network magic values, the
//! checksum version gate, the payload size ceiling) and a [`WireConfig`]
//! structure that carries them through the codec.
//!
//! ## Configuration Sources
//! - Network presets via `WireConfig::mainnet()` / `testnet()` / `regtest()`
//! - TOML files via `from_file()`
//! - Environment-specific overrides via `from_env()`
//!
//! ## Security Considerations
//! - The payload ceiling is enforced *before* any allocation, so a hostile
//!   length field cannot trigger memory exhaustion
//! - Magic values identify the network; frames for the wrong network are
//!   rejected at the header

use crate::error::{Result, WireError};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Default protocol version advertised by this crate
pub const PROTOCOL_VERSION: u32 = 70012;

/// First protocol version whose frames carry a payload checksum
pub const CHECKSUM_VERSION: u32 = 60002;

/// First protocol version whose `version` payload carries the relay flag
pub const RELAY_VERSION: u32 = 70001;

/// Max allowed payload size in bytes (32 MiB)
pub const MAX_PAYLOAD_LEN: u32 = 0x0200_0000;

/// Width of the command field on the wire
pub const COMMAND_LEN: usize = 12;

/// Mainnet magic (bytes `F9 BE B4 D9` on the wire)
pub const MAINNET_MAGIC: u32 = 0xD9B4_BEF9;

/// Testnet3 magic (bytes `0B 11 09 07` on the wire)
pub const TESTNET3_MAGIC: u32 = 0x0709_110B;

/// Regtest magic (bytes `FA BF B5 DA` on the wire)
pub const REGTEST_MAGIC: u32 = 0xDAB5_BFFA;

/// Wire-level configuration carried through the codec.
///
/// Controls which network's frames are accepted, how payload bodies are
/// encoded, and when the checksum field is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WireConfig {
    /// Network magic expected at the start of every frame
    pub magic: u32,

    /// Protocol version used when encoding payload bodies
    pub protocol_version: u32,

    /// Versions at or above this carry the 4-byte payload checksum
    pub checksum_version: u32,

    /// Maximum declared payload length accepted before allocation
    pub max_payload_len: u32,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl WireConfig {
    /// Mainnet preset with the current default protocol version
    pub fn mainnet() -> Self {
        Self {
            magic: MAINNET_MAGIC,
            protocol_version: PROTOCOL_VERSION,
            checksum_version: CHECKSUM_VERSION,
            max_payload_len: MAX_PAYLOAD_LEN,
        }
    }

    /// Testnet3 preset
    pub fn testnet() -> Self {
        Self {
            magic: TESTNET3_MAGIC,
            ..Self::mainnet()
        }
    }

    /// Regtest preset
    pub fn regtest() -> Self {
        Self {
            magic: REGTEST_MAGIC,
            ..Self::mainnet()
        }
    }

    /// Whether frames encoded at `version` carry the checksum field
    pub fn checksum_present(&self, version: u32) -> bool {
        version >= self.checksum_version
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| WireError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| WireError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| WireError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Start with the mainnet defaults
        let mut config = Self::default();

        // Override with environment variables
        if let Ok(magic) = std::env::var("P2P_WIRE_MAGIC") {
            let raw = magic.trim_start_matches("0x");
            match u32::from_str_radix(raw, 16) {
                Ok(val) => config.magic = val,
                Err(e) => {
                    return Err(WireError::ConfigError(format!(
                        "Invalid P2P_WIRE_MAGIC '{magic}': {e}"
                    )))
                }
            }
        }

        if let Ok(version) = std::env::var("P2P_WIRE_PROTOCOL_VERSION") {
            if let Ok(val) = version.parse::<u32>() {
                config.protocol_version = val;
            }
        }

        if let Ok(version) = std::env::var("P2P_WIRE_CHECKSUM_VERSION") {
            if let Ok(val) = version.parse::<u32>() {
                config.checksum_version = val;
            }
        }

        if let Ok(limit) = std::env::var("P2P_WIRE_MAX_PAYLOAD_LEN") {
            if let Ok(val) = limit.parse::<u32>() {
                config.max_payload_len = val;
            }
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| WireError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| WireError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        // Validate magic
        if self.magic == 0 {
            errors.push("Network magic cannot be 0".to_string());
        }

        // Validate payload ceiling
        if self.max_payload_len == 0 {
            errors.push("Max payload length must be greater than 0".to_string());
        } else if self.max_payload_len > MAX_PAYLOAD_LEN {
            errors.push(format!(
                "Max payload length very high: {} bytes (network standard: {} bytes)",
                self.max_payload_len, MAX_PAYLOAD_LEN
            ));
        }

        // Validate version gate
        if self.protocol_version < self.checksum_version {
            errors.push(format!(
                "Protocol version {} predates the checksum gate {}; locally encoded frames will carry no checksum",
                self.protocol_version, self.checksum_version
            ));
        }

        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(WireError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}
