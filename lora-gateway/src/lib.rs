// LoRa Gateway - Relay from radio to host
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # LoRa Gateway - Relay from radio to host
//!
//! Receives node records over the radio, appends the RSSI and SNR the
//! radio measured for each packet, and forwards them to a host over a
//! line-oriented byte stream.
//!
//! ## Features
//!
//! - **Per-packet link metadata**: read right after the packet is drained
//! - **Opaque payloads**: records are spliced, never re-encoded
//! - **Malformed packets dropped**: logged and counted, relay continues
//!
//! ## Host stream
//!
//! ```text
//! READY:Gateway_Online
//! DATA:{"sensor_id":"SALA_SERVIDORES_01","temperatura":28.00,"umidade":45.00,"poeira":20.00,"rssi":-42,"snr":7.5}
//! ```
//!
//! A failed link bring-up produces a single `ERROR:<reason>` line instead
//! of the readiness line, and is fatal.

pub mod config;
pub mod error;
pub mod relay;

pub use config::{GatewayConfig, LinkSettings, DEFAULT_PORT};
pub use error::{GatewayError, Result};
pub use relay::{GatewayRelay, RelayEvent, RelayStats, RetryPolicy};
