// LoRa Node - Duty-cycled sensor node
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Node process settings
//!
//! Everything the host process needs besides the engine's own
//! [`NodeConfig`]: where the gateway is, where the retained state lives
//! between invocations, and how the simulated sensor behaves.

use lora_telemetry::{ConfigError, NodeConfig, SimulatedSensor};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading settings
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Settings file unreadable
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not valid TOML for these settings
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values out of range
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Settings of one node process
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NodeSettings {
    /// Engine configuration
    pub node: NodeConfig,
    /// Gateway UDP address
    pub gateway: SocketAddr,
    /// Retained-state snapshot; in-memory retention when unset
    pub state_file: Option<PathBuf>,
    /// Simulated sensor parameters
    pub sensor: SensorSettings,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            node: NodeConfig::default(),
            gateway: SocketAddr::from(([127, 0, 0, 1], 47_000)),
            state_file: None,
            sensor: SensorSettings::default(),
        }
    }
}

impl NodeSettings {
    /// Parse settings from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Validate the engine configuration and sensor parameters
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.node.validate()?;
        self.sensor.validate()?;
        Ok(())
    }
}

/// Simulated sensor parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SensorSettings {
    /// Temperature the simulation varies around, °C
    pub temp_base: f64,
    /// Humidity the simulation varies around, %
    pub humidity_base: f64,
    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            temp_base: 28.0,
            humidity_base: 45.0,
            seed: None,
        }
    }
}

impl SensorSettings {
    /// Build the simulator for `sensor_id`
    pub fn build(&self, sensor_id: &str) -> SimulatedSensor {
        match self.seed {
            Some(seed) => {
                SimulatedSensor::with_seed(sensor_id, self.temp_base, self.humidity_base, seed)
            }
            None => SimulatedSensor::new(sensor_id, self.temp_base, self.humidity_base),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.temp_base.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "sensor.temp_base",
                reason: "must be finite".to_string(),
            });
        }
        if !(0.0..=100.0).contains(&self.humidity_base) {
            return Err(ConfigError::InvalidValue {
                field: "sensor.humidity_base",
                reason: format!("{} outside 0-100 %", self.humidity_base),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lora_telemetry::{CommitPolicy, SensorProvider};
    use std::time::Duration;

    #[test]
    fn test_defaults_validate() {
        let settings = NodeSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.gateway.port(), 47_000);
        assert!(settings.state_file.is_none());
    }

    #[test]
    fn test_from_toml() {
        let settings = NodeSettings::from_toml_str(
            r#"
gateway = "10.0.0.2:47000"
state_file = "/var/lib/node/state.json"

[node]
sensor_id = "LABORATORIO_REDES"
sleep_duration = 0.5
commit_policy = "rollback_on_fault"

[node.thresholds]
temperature = 1.0

[sensor]
temp_base = 24.0
humidity_base = 55.0
seed = 9
"#,
        )
        .unwrap();

        assert_eq!(settings.node.sensor_id, "LABORATORIO_REDES");
        assert_eq!(settings.node.sleep_duration, Duration::from_millis(500));
        assert_eq!(settings.node.commit_policy, CommitPolicy::RollbackOnFault);
        assert_eq!(settings.node.thresholds.temperature, 1.0);
        assert_eq!(settings.node.thresholds.humidity, 2.0);
        assert_eq!(settings.node.force_send_limit, 60);
        assert_eq!(
            settings.state_file.as_deref(),
            Some(Path::new("/var/lib/node/state.json"))
        );
        assert_eq!(settings.sensor.seed, Some(9));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let result = NodeSettings::from_toml_str("[node]\ncommit_policy = \"retry\"\n");
        assert!(matches!(result, Err(SettingsError::Parse(_))));
    }

    #[test]
    fn test_humidity_base_out_of_range() {
        let settings = NodeSettings {
            sensor: SensorSettings {
                humidity_base: 120.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Invalid(_))
        ));
    }

    #[test]
    fn test_seeded_sensor_build() {
        let sensor = SensorSettings {
            seed: Some(3),
            ..Default::default()
        };
        let mut a = sensor.build("SALA_SERVIDORES_01");
        let mut b = sensor.build("SALA_SERVIDORES_01");
        assert_eq!(a.sample(), b.sample());
    }

    #[test]
    fn test_missing_file() {
        let result = NodeSettings::load(Path::new("/nonexistent/node.toml"));
        assert!(matches!(result, Err(SettingsError::Io { .. })));
    }
}
