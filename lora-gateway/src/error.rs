// LoRa Gateway - Relay from radio to host
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for the gateway relay

use lora_telemetry::{ConfigError, TransportError};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Radio could not be brought up; fatal
    #[error("Link bring-up failed: {0}")]
    LinkBringUp(TransportError),

    /// Receiving from the radio failed
    #[error("Receive failed: {0}")]
    Receive(#[from] TransportError),

    /// Writing to the host stream failed
    #[error("Host stream error: {0}")]
    Host(#[from] std::io::Error),

    /// Configuration file unreadable
    #[error("Failed to read {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for the gateway
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl GatewayError {
    /// True when the receiver has no more packets to deliver
    pub fn is_closed(&self) -> bool {
        matches!(self, GatewayError::Receive(TransportError::Closed))
    }
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;
