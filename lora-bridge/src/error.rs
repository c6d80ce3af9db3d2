// LoRa Bridge - Host side of the gateway stream
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for the host bridge

use thiserror::Error;

/// Main error type for bridge operations
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Reading the gateway stream or writing records failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An accepted record could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The collection server could not be reached
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The collection server refused a record
    #[error("Server responded with status {status}")]
    ServerStatus { status: u16 },
}

impl BridgeError {
    /// True when a single record could not be delivered but the bridge can go on
    pub fn is_delivery_failure(&self) -> bool {
        matches!(self, BridgeError::Http(_) | BridgeError::ServerStatus { .. })
    }
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;
