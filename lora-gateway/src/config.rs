// LoRa Gateway - Relay from radio to host
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Configuration types for the gateway

use crate::error::{GatewayError, Result};
use lora_telemetry::{ConfigError, LinkModel, RadioConfig};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

/// Default UDP port the development gateway listens on
pub const DEFAULT_PORT: u16 = 47_000;

/// Gateway-level configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Modulation parameters, must match the nodes
    pub radio: RadioConfig,

    /// Address the UDP stand-in receiver binds to
    pub listen: SocketAddr,

    /// Synthetic link metadata reported for UDP packets
    pub link: LinkSettings,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            radio: RadioConfig::default(),
            listen: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            link: LinkSettings::default(),
        }
    }
}

impl GatewayConfig {
    /// Create a configuration listening on a specific address
    pub fn with_listen(listen: SocketAddr) -> Self {
        Self {
            listen,
            ..Default::default()
        }
    }

    /// Load and validate a TOML configuration file
    ///
    /// # Errors
    ///
    /// [`GatewayError::ConfigFile`] if the file cannot be read,
    /// [`GatewayError::ConfigParse`] if it is not valid TOML for the
    /// gateway and [`GatewayError::InvalidConfig`] if a value is out of
    /// range.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| GatewayError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate radio parameters and link settings
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.radio.validate()?;
        self.link.validate()
    }
}

/// Mean and spread of the synthetic RSSI/SNR
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LinkSettings {
    /// Mean RSSI in dBm
    pub rssi: i16,
    /// Mean SNR in dB
    pub snr: f32,
    /// Maximum RSSI deviation per packet in dB
    pub rssi_jitter: i16,
    /// Maximum SNR deviation per packet in dB
    pub snr_jitter: f32,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            rssi: -60,
            snr: 9.5,
            rssi_jitter: 8,
            snr_jitter: 1.5,
        }
    }
}

impl LinkSettings {
    /// Constant metadata, no jitter
    pub fn fixed(rssi: i16, snr: f32) -> Self {
        Self {
            rssi,
            snr,
            rssi_jitter: 0,
            snr_jitter: 0.0,
        }
    }

    /// Build the link model these settings describe
    pub fn model(&self) -> LinkModel {
        if self.rssi_jitter == 0 && self.snr_jitter == 0.0 {
            LinkModel::fixed(self.rssi, self.snr)
        } else {
            LinkModel::jittered(self.rssi, self.snr, (self.rssi_jitter, self.snr_jitter))
        }
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.rssi > 0 {
            return Err(ConfigError::InvalidValue {
                field: "link.rssi",
                reason: format!("{} dBm is above 0 dBm", self.rssi),
            });
        }
        if !self.snr.is_finite() || !self.snr_jitter.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "link.snr",
                reason: "must be finite".to_string(),
            });
        }
        Ok(())
    }
}
