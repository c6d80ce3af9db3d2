// LoRa Telemetry - Adaptive duty-cycle sensor node
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Message codec
//!
//! Readings travel as a compact JSON object with a fixed field order:
//!
//! ```text
//! {"sensor_id":"<id>","temperatura":<2dp>,"umidade":<2dp>,"poeira":<2dp>}
//! ```
//!
//! The gateway treats this record as opaque text. [`augment`] only locates
//! the final closing delimiter and splices link metadata before it:
//!
//! ```text
//! {...,"poeira":20.00,"rssi":-42,"snr":7.5}
//! ```

use crate::error::{AugmentError, DecodeError, EncodeError};
use crate::protocol::{
    AugmentedReading, LinkQuality, Reading, FIELD_RSSI, FIELD_SNR, RECORD_CLOSE,
};
use std::fmt::Write as _;

/// Encode a reading into its wire record
///
/// Scalars are written with two decimal places. A non-finite scalar has
/// no JSON representation and is written as `null`; use [`try_encode`]
/// to reject such readings instead.
pub fn encode(reading: &Reading) -> Vec<u8> {
    // Value's Display escapes the identifier and cannot fail
    let id = serde_json::Value::String(reading.sensor_id.clone());
    let mut out = String::with_capacity(96);
    let _ = write!(out, "{{\"sensor_id\":{}", id);
    for (name, value) in reading.fields() {
        let _ = if value.is_finite() {
            write!(out, ",\"{}\":{:.2}", name, value)
        } else {
            write!(out, ",\"{}\":null", name)
        };
    }
    out.push(RECORD_CLOSE as char);
    out.into_bytes()
}

/// Encode a reading, rejecting non-finite scalars
pub fn try_encode(reading: &Reading) -> Result<Vec<u8>, EncodeError> {
    for (name, value) in reading.fields() {
        if !value.is_finite() {
            return Err(EncodeError::NonFinite {
                field: name,
                value: value.to_string(),
            });
        }
    }
    Ok(encode(reading))
}

/// Decode a wire record back into a reading
///
/// Unknown fields (for example the gateway's link metadata) are ignored.
pub fn decode(bytes: &[u8]) -> Result<Reading, DecodeError> {
    let text = as_utf8(bytes)?;
    serde_json::from_str(text).map_err(|e| DecodeError::MalformedRecord {
        reason: e.to_string(),
    })
}

/// Decode a gateway-augmented record into the reading and its link metadata
pub fn decode_augmented(bytes: &[u8]) -> Result<(Reading, LinkQuality), DecodeError> {
    let text = as_utf8(bytes)?;
    let parsed: AugmentedReading =
        serde_json::from_str(text).map_err(|e| DecodeError::MalformedRecord {
            reason: e.to_string(),
        })?;
    Ok((parsed.reading, parsed.link))
}

/// Splice link metadata into an encoded record
///
/// Trailing ASCII whitespace after the closing delimiter is dropped. The
/// rest of the payload is copied byte for byte.
pub fn augment(payload: &[u8], link: LinkQuality) -> Result<Vec<u8>, AugmentError> {
    let trimmed = trim_ascii_end(payload);
    match trimmed.last() {
        Some(&RECORD_CLOSE) => {}
        _ => {
            return Err(AugmentError::MissingClosingDelimiter { len: payload.len() });
        }
    }

    let body = &trimmed[..trimmed.len() - 1];
    let suffix = format!(
        ",\"{}\":{},\"{}\":{:.1}}}",
        FIELD_RSSI, link.rssi, FIELD_SNR, link.snr
    );

    let mut out = Vec::with_capacity(body.len() + suffix.len());
    out.extend_from_slice(body);
    out.extend_from_slice(suffix.as_bytes());
    Ok(out)
}

/// Augment a payload and return it as text for the host stream
///
/// Fails if the payload has no closing delimiter or is not valid UTF-8.
pub fn augment_text(payload: &[u8], link: LinkQuality) -> crate::Result<String> {
    let augmented = augment(payload, link)?;
    let text = String::from_utf8(augmented).map_err(|e| DecodeError::InvalidUtf8 {
        valid_up_to: e.utf8_error().valid_up_to(),
    })?;
    Ok(text)
}

fn as_utf8(bytes: &[u8]) -> Result<&str, DecodeError> {
    std::str::from_utf8(bytes).map_err(|e| DecodeError::InvalidUtf8 {
        valid_up_to: e.valid_up_to(),
    })
}

fn trim_ascii_end(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    &bytes[..end]
}
