// LoRa Node - Duty-cycled sensor node
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # LoRa Node - Duty-cycled sensor node
//!
//! Host-side node process around [`lora_telemetry::DutyCycleEngine`]: a
//! simulated sensor, the UDP stand-in radio and thread sleep as the
//! suspend primitive.
//!
//! With a state file, each invocation can run a single cycle and exit,
//! which models the real power-down: only the retained snapshot survives
//! between cycles.

pub mod runner;
pub mod settings;

pub use runner::{run, RunSummary};
pub use settings::{NodeSettings, SensorSettings, SettingsError};
