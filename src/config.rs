// LoRa Telemetry - Adaptive duty-cycle sensor node
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Configuration types for nodes and radios
//!
//! All tunables are collected into immutable structures handed to the
//! engine at construction. Every structure has a [`Default`] matching the
//! deployed firmware and can be deserialized from a TOML/JSON file.

use crate::detector::Thresholds;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Number of consecutive unchanged cycles that forces a transmission
pub const FORCE_SEND_LIMIT: u32 = 60;

/// Default suspension between wake cycles
pub const DEFAULT_SLEEP_DURATION: Duration = Duration::from_secs(1);

/// Largest payload a LoRa frame can carry
pub const MAX_FRAME_SIZE: usize = 255;

/// Longest node identifier accepted downstream
pub const MAX_SENSOR_ID_LEN: usize = 50;

/// LoRa bandwidths supported by SX127x transceivers, in Hz
pub const SUPPORTED_BANDWIDTHS: [u32; 10] = [
    7_800, 10_400, 15_600, 20_800, 31_250, 41_700, 62_500, 125_000, 250_000, 500_000,
];

/// What to do with the optimistic send commit when the radio fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// Keep the commit: the faulted reading is not retried (firmware behavior)
    #[default]
    Optimistic,
    /// Restore `last_sent` and the skip counter so the next cycle re-evaluates
    RollbackOnFault,
}

/// LoRa modulation and power parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    /// Carrier frequency in Hz (default: 915 MHz)
    pub frequency_hz: u64,
    /// Spreading factor, 6-12 (default: 7)
    pub spreading_factor: u8,
    /// Signal bandwidth in Hz (default: 125 kHz)
    pub bandwidth_hz: u32,
    /// Coding rate denominator, 5-8 for 4/5..4/8 (default: 5)
    pub coding_rate: u8,
    /// Transmit power in dBm, 2-20 (default: 17)
    pub tx_power_dbm: i8,
    /// Sync word shared by node and gateway (default: 0x12)
    pub sync_word: u8,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 915_000_000,
            spreading_factor: 7,
            bandwidth_hz: 125_000,
            coding_rate: 5,
            tx_power_dbm: 17,
            sync_word: 0x12,
        }
    }
}

impl RadioConfig {
    /// Create a configuration on a specific carrier frequency
    pub fn with_frequency(frequency_hz: u64) -> Self {
        Self {
            frequency_hz,
            ..Default::default()
        }
    }

    /// Slowest, most robust modulation: SF12 at 125 kHz, CR 4/8
    pub fn long_range() -> Self {
        Self {
            spreading_factor: 12,
            coding_rate: 8,
            tx_power_dbm: 20,
            ..Default::default()
        }
    }

    /// Check every parameter against what the transceiver supports
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(137_000_000..=1_020_000_000).contains(&self.frequency_hz) {
            return Err(ConfigError::invalid(
                "radio.frequency_hz",
                format!("{} Hz outside 137-1020 MHz", self.frequency_hz),
            ));
        }
        if !(6..=12).contains(&self.spreading_factor) {
            return Err(ConfigError::invalid(
                "radio.spreading_factor",
                format!("SF{} outside SF6-SF12", self.spreading_factor),
            ));
        }
        if !SUPPORTED_BANDWIDTHS.contains(&self.bandwidth_hz) {
            return Err(ConfigError::invalid(
                "radio.bandwidth_hz",
                format!("{} Hz is not a LoRa bandwidth", self.bandwidth_hz),
            ));
        }
        if !(5..=8).contains(&self.coding_rate) {
            return Err(ConfigError::invalid(
                "radio.coding_rate",
                format!("4/{} outside 4/5-4/8", self.coding_rate),
            ));
        }
        if !(2..=20).contains(&self.tx_power_dbm) {
            return Err(ConfigError::invalid(
                "radio.tx_power_dbm",
                format!("{} dBm outside 2-20 dBm", self.tx_power_dbm),
            ));
        }
        Ok(())
    }
}

/// Node-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Identifier carried in every message
    pub sensor_id: String,
    /// Suspension between wake cycles (default: 1 s)
    #[serde(with = "duration_secs")]
    pub sleep_duration: Duration,
    /// Per-field change thresholds
    pub thresholds: Thresholds,
    /// Unchanged cycles before a forced send (default: 60)
    pub force_send_limit: u32,
    /// Handling of the send commit on radio failure
    pub commit_policy: CommitPolicy,
    /// Radio parameters
    pub radio: RadioConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            sensor_id: "SALA_SERVIDORES_01".to_string(),
            sleep_duration: DEFAULT_SLEEP_DURATION,
            thresholds: Thresholds::default(),
            force_send_limit: FORCE_SEND_LIMIT,
            commit_policy: CommitPolicy::default(),
            radio: RadioConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Create a configuration for a node identifier
    pub fn with_sensor_id(sensor_id: impl Into<String>) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            ..Default::default()
        }
    }

    /// Create a configuration with a custom sleep duration
    pub fn with_sleep_duration(sleep_duration: Duration) -> Self {
        Self {
            sleep_duration,
            ..Default::default()
        }
    }

    /// Check the configuration before handing it to an engine
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sensor_id.is_empty() {
            return Err(ConfigError::invalid("sensor_id", "must not be empty"));
        }
        if self.sensor_id.len() > MAX_SENSOR_ID_LEN || !self.sensor_id.is_ascii() {
            return Err(ConfigError::invalid(
                "sensor_id",
                format!("must be ASCII and at most {} bytes", MAX_SENSOR_ID_LEN),
            ));
        }
        if self.sleep_duration.is_zero() {
            return Err(ConfigError::invalid("sleep_duration", "must be positive"));
        }
        if self.force_send_limit == 0 {
            return Err(ConfigError::invalid(
                "force_send_limit",
                "must be at least one cycle",
            ));
        }
        self.thresholds.validate()?;
        self.radio.validate()
    }
}

/// Serialize a [`Duration`] as fractional seconds
pub mod duration_secs {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}
