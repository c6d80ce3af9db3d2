// LoRa Bridge - Host side of the gateway stream
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # LoRa Bridge - Host side of the gateway stream
//!
//! Consumes the gateway's `READY:`/`DATA:`/`ERROR:` line stream, filters
//! out records that were corrupted on the air, and forwards accepted
//! records stamped with their reception time. Any `Write` takes them as
//! JSON lines; [`HttpSink`] POSTs them to a collection server.
//!
//! ```rust
//! use lora_bridge::HostBridge;
//!
//! let stream = "READY:Gateway_Online\n\
//!               DATA:{\"sensor_id\":\"A\",\"temperatura\":21.5,\"umidade\":40.0,\"poeira\":12.0}\n\
//!               DATA:{\"sensor_id\":\"A\",\"temperatura\":99.0,\"umidade\":40.0,\"poeira\":12.0}\n";
//!
//! let mut bridge = HostBridge::new(Vec::new());
//! let stats = bridge.run(stream.as_bytes()).unwrap();
//! assert_eq!(stats.accepted, 1);
//! assert_eq!(stats.rejected, 1);
//! ```

pub mod bridge;
pub mod error;
pub mod sink;
pub mod stats;
pub mod validate;

pub use bridge::{HostBridge, LineOutcome, StampedRecord};
pub use error::{BridgeError, Result};
pub use sink::{HttpSink, RecordSink, DEFAULT_SERVER_URL, DEFAULT_TIMEOUT};
pub use stats::BridgeStats;
pub use validate::{validate, RejectReason, ValidatedRecord};
