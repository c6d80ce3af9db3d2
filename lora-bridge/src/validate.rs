// LoRa Bridge - Host side of the gateway stream
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Record validation
//!
//! Radio payloads can arrive corrupted in ways that still parse as JSON.
//! A record is accepted only if it carries a plausible identifier and
//! plausible values.

use lora_telemetry::protocol::{
    FIELD_DUST, FIELD_HUMIDITY, FIELD_RSSI, FIELD_SENSOR_ID, FIELD_SNR, FIELD_TEMPERATURE,
};
use lora_telemetry::MAX_SENSOR_ID_LEN;
use serde::Serialize;
use serde_json::{Map, Value};
use std::ops::RangeInclusive;
use thiserror::Error;

/// Plausible temperatures, °C
pub const TEMPERATURE_RANGE: RangeInclusive<f64> = 0.0..=60.0;
/// Plausible relative humidity, %
pub const HUMIDITY_RANGE: RangeInclusive<f64> = 0.0..=100.0;

/// Why a record was rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RejectReason {
    #[error("corrupt JSON: {0}")]
    InvalidJson(String),

    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("missing field {0}")]
    MissingField(&'static str),

    #[error("sensor_id is not a string")]
    SensorIdNotString,

    #[error("sensor_id is {len} characters, max {max}")]
    SensorIdTooLong { len: usize, max: usize },

    #[error("sensor_id contains non-ASCII characters")]
    SensorIdNotAscii,

    #[error("{0} is not numeric")]
    NotNumeric(&'static str),

    #[error("temperature {0} °C out of range")]
    TemperatureOutOfRange(f64),

    #[error("humidity {0} % out of range")]
    HumidityOutOfRange(f64),
}

/// A record that passed validation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedRecord {
    pub sensor_id: String,
    #[serde(rename = "temperatura")]
    pub temperature: f64,
    #[serde(rename = "umidade")]
    pub humidity: f64,
    #[serde(rename = "poeira")]
    pub dust: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rssi: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snr: Option<f64>,
}

/// Validate one relayed record
pub fn validate(json: &str) -> Result<ValidatedRecord, RejectReason> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| RejectReason::InvalidJson(e.to_string()))?;
    let object = value.as_object().ok_or(RejectReason::NotAnObject)?;

    let sensor_id = required(object, FIELD_SENSOR_ID)?;
    required(object, FIELD_TEMPERATURE)?;

    let sensor_id = sensor_id.as_str().ok_or(RejectReason::SensorIdNotString)?;
    let len = sensor_id.chars().count();
    if len > MAX_SENSOR_ID_LEN {
        return Err(RejectReason::SensorIdTooLong {
            len,
            max: MAX_SENSOR_ID_LEN,
        });
    }
    if !sensor_id.is_ascii() {
        return Err(RejectReason::SensorIdNotAscii);
    }

    let temperature = numeric(object, FIELD_TEMPERATURE)?;
    let humidity = numeric(object, FIELD_HUMIDITY)?;
    let dust = numeric(object, FIELD_DUST)?;

    if !TEMPERATURE_RANGE.contains(&temperature) {
        return Err(RejectReason::TemperatureOutOfRange(temperature));
    }
    if !HUMIDITY_RANGE.contains(&humidity) {
        return Err(RejectReason::HumidityOutOfRange(humidity));
    }

    Ok(ValidatedRecord {
        sensor_id: sensor_id.to_string(),
        temperature,
        humidity,
        dust,
        rssi: object.get(FIELD_RSSI).and_then(Value::as_i64),
        snr: object.get(FIELD_SNR).and_then(Value::as_f64),
    })
}

fn required<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Value, RejectReason> {
    object.get(field).ok_or(RejectReason::MissingField(field))
}

/// A JSON number, or a string holding one
fn numeric(object: &Map<String, Value>, field: &'static str) -> Result<f64, RejectReason> {
    let value = match required(object, field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value
        .filter(|v| v.is_finite())
        .ok_or(RejectReason::NotNumeric(field))
}
