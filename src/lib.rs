//! # LoRa Telemetry - Adaptive duty-cycle sensor node
//!
//! Core of a battery-powered telemetry node that wakes on a timer, samples
//! its sensors, transmits only when the reading is worth the radio time,
//! and powers down until the next cycle.
//!
//! ## Key Features
//!
//! - **Change-gated transmission**: per-field thresholds, inclusive boundary
//! - **Forced send watchdog**: bounded staleness after N quiet cycles
//! - **Retained state**: explicit region surviving each power-down
//! - **Shared wire codec**: node records, gateway link-metadata splicing
//!
//! ## Quick Start
//!
//! ```rust
//! use lora_telemetry::{
//!     DutyCycleEngine, MemoryRetention, MemoryTransport, NodeConfig, Reading,
//!     RecordingPower, ScriptedSensor,
//! };
//!
//! let sensor = ScriptedSensor::new(Reading::new("SALA_SERVIDORES_01", 28.0, 45.0, 20.0));
//! let mut engine = DutyCycleEngine::new(
//!     NodeConfig::default(),
//!     sensor,
//!     MemoryTransport::new(),
//!     RecordingPower::new(),
//! )
//! .unwrap();
//!
//! // Stands in for RTC retention memory
//! let mut region = MemoryRetention::new();
//!
//! let first = engine.wake(&mut region);
//! assert!(first.outcome.is_sent());
//!
//! let second = engine.wake(&mut region);
//! assert!(!second.outcome.is_sent());
//! assert_eq!(second.skip_count, 1);
//! ```
//!
//! ## Modules
//!
//! - [`protocol`]: Readings, link metadata and wire field names
//! - [`codec`]: Wire record encoding, decoding and augmentation
//! - [`framing`]: Gateway-to-host line framing
//! - [`detector`]: Per-field change detection
//! - [`retained`]: State surviving power-down
//! - [`engine`]: The wake-cycle state machine
//! - [`radio`]: Radio traits and in-memory links
//! - [`udp`]: UDP stand-in for the radio on a development host

// Modules
pub mod codec;
pub mod config;
pub mod detector;
pub mod engine;
pub mod error;
pub mod framing;
pub mod power;
pub mod protocol;
pub mod radio;
pub mod retained;
pub mod sensor;
pub mod udp;

// Re-exports for convenient access
pub use config::{
    CommitPolicy, NodeConfig, RadioConfig, DEFAULT_SLEEP_DURATION, FORCE_SEND_LIMIT,
    MAX_FRAME_SIZE, MAX_SENSOR_ID_LEN,
};
pub use detector::{ChangeDetector, ChangedFields, Evaluation, Thresholds};
pub use engine::{CycleOutcome, CycleReport, DutyCycleEngine, SendTrigger};
pub use error::{
    AugmentError, ConfigError, DecodeError, EncodeError, Result, RetentionError, TelemetryError,
    TransportError,
};
pub use framing::HostLine;
pub use power::{Clock, MonotonicClock, PowerControl, RecordingPower, SteppingClock, ThreadSleep};
pub use protocol::{AugmentedReading, LinkQuality, Reading};
pub use radio::{LinkMetrics, LossyTransport, MemoryReceiver, MemoryTransport, Receiver, Transport};
pub use retained::{FileRetention, MemoryRetention, PersistentState, RetainedRegion};
pub use sensor::{ScriptedSensor, SensorProvider, SimulatedSensor};
pub use udp::{LinkModel, UdpReceiver, UdpTransport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
