//! Protocol definitions shared by node, gateway and host
//!
//! This module defines the core values that travel over the link:
//! - [`Reading`]: one sampled observation plus the node identifier
//! - [`LinkQuality`]: per-packet metadata attached by the gateway
//! - Field names and delimiters of the wire record

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire name of the identifier field
pub const FIELD_SENSOR_ID: &str = "sensor_id";
/// Wire name of the temperature field
pub const FIELD_TEMPERATURE: &str = "temperatura";
/// Wire name of the humidity field
pub const FIELD_HUMIDITY: &str = "umidade";
/// Wire name of the dust field
pub const FIELD_DUST: &str = "poeira";
/// Wire name of the signal strength field (gateway only)
pub const FIELD_RSSI: &str = "rssi";
/// Wire name of the signal-to-noise field (gateway only)
pub const FIELD_SNR: &str = "snr";

/// Closing delimiter of an encoded record
pub const RECORD_CLOSE: u8 = b'}';

/// One sampled observation from a sensor node
///
/// Readings are produced fresh every wake cycle. Only the last one that
/// was sent is retained across a power-down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Identifier of the node that produced the reading
    pub sensor_id: String,
    /// Temperature in °C
    #[serde(rename = "temperatura")]
    pub temperature: f64,
    /// Relative humidity in %
    #[serde(rename = "umidade")]
    pub humidity: f64,
    /// Particulate concentration in µg/m³
    #[serde(rename = "poeira")]
    pub dust: f64,
}

impl Reading {
    /// Create a new reading
    pub fn new(sensor_id: impl Into<String>, temperature: f64, humidity: f64, dust: f64) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            temperature,
            humidity,
            dust,
        }
    }

    /// Check that every scalar field is a finite number
    pub fn is_finite(&self) -> bool {
        self.temperature.is_finite() && self.humidity.is_finite() && self.dust.is_finite()
    }

    /// Scalar fields in wire order, paired with their wire names
    pub fn fields(&self) -> [(&'static str, f64); 3] {
        [
            (FIELD_TEMPERATURE, self.temperature),
            (FIELD_HUMIDITY, self.humidity),
            (FIELD_DUST, self.dust),
        ]
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] T={:.2}°C U={:.2}% P={:.2}µg/m³",
            self.sensor_id, self.temperature, self.humidity, self.dust
        )
    }
}

/// Link-quality metadata of one received packet
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LinkQuality {
    /// Received signal strength in dBm
    pub rssi: i16,
    /// Signal-to-noise ratio in dB
    pub snr: f32,
}

impl LinkQuality {
    /// Create new link metadata
    pub fn new(rssi: i16, snr: f32) -> Self {
        Self { rssi, snr }
    }
}

impl fmt::Display for LinkQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RSSI:{} dBm, SNR:{:.1}", self.rssi, self.snr)
    }
}

/// A reading as seen by the host: the node's record plus link metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentedReading {
    /// The node's reading
    #[serde(flatten)]
    pub reading: Reading,
    /// Metadata spliced in by the gateway
    #[serde(flatten)]
    pub link: LinkQuality,
}
