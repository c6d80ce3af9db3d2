//! Error types for the telemetry core
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias for telemetry operations
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Main error type for telemetry operations
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Radio transport error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Payload encoding error
    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),

    /// Payload decoding error
    #[error("Decoding error: {0}")]
    Decode(#[from] DecodeError),

    /// Link metadata augmentation error
    #[error("Augmentation error: {0}")]
    Augment(#[from] AugmentError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Retained-state storage error
    #[error("Retention error: {0}")]
    Retention(#[from] RetentionError),
}

/// Errors raised by a radio transport
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Radio hardware or link failed to initialize
    #[error("Radio initialization failed: {reason}")]
    InitFailed { reason: String },

    /// Transmit was requested but the frame did not leave the radio
    #[error("Transmission failed: {reason}")]
    SendFailed { reason: String },

    /// Frame exceeds what the link can carry
    #[error("Frame too large: {size} bytes exceeds maximum {max}")]
    FrameTooLarge { size: usize, max: usize },

    /// The receiving side has been shut down
    #[error("Link closed")]
    Closed,

    /// Underlying socket error (host-side links)
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err.to_string())
    }
}

/// Errors while encoding a reading
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    /// Value is not a valid number (NaN, Inf)
    #[error("Invalid value for {field}: {value}")]
    NonFinite { field: &'static str, value: String },
}

/// Errors while decoding a wire record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Payload is not valid UTF-8
    #[error("Payload is not valid UTF-8 at byte {valid_up_to}")]
    InvalidUtf8 { valid_up_to: usize },

    /// Payload is not a well-formed record
    #[error("Malformed record: {reason}")]
    MalformedRecord { reason: String },
}

/// Errors while splicing link metadata into a record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AugmentError {
    /// Payload does not end with the record's closing delimiter
    #[error("Payload does not end with a closing delimiter ({len} bytes)")]
    MissingClosingDelimiter { len: usize },
}

/// Errors raised by configuration validation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Field value outside its admissible range
    #[error("Invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors raised by a retained-state region
#[derive(Error, Debug)]
pub enum RetentionError {
    /// Backing storage could not be read or written
    #[error("Retention storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot could not be (de)serialized
    #[error("Retained snapshot is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
