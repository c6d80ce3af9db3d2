// LoRa Telemetry - Adaptive duty-cycle sensor node
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Duty-cycle engine
//!
//! One call to [`DutyCycleEngine::wake`] is one wake cycle of the node:
//!
//! ```text
//! WAKE ─► MEASURE ─► EVALUATE ─┬─► SKIP ─────────────────┬─► PERSIST ─► SUSPEND
//!                              └─► SEND ─┬───────────────┘
//!                                        └─► RADIO_FAULT ┘
//! ```
//!
//! The engine keeps no state of its own between cycles: everything that
//! must survive the suspension lives in the [`PersistentState`] it is
//! handed. A send commits `last_sent` and resets the skip counter before
//! the radio is touched; see [`CommitPolicy`] for what happens when the
//! radio then fails.

use crate::codec;
use crate::config::{CommitPolicy, NodeConfig};
use crate::detector::{ChangeDetector, ChangedFields, Evaluation};
use crate::error::{ConfigError, TransportError};
use crate::power::{Clock, MonotonicClock, PowerControl};
use crate::protocol::Reading;
use crate::radio::Transport;
use crate::retained::{PersistentState, RetainedRegion};
use crate::sensor::SensorProvider;
use std::fmt;
use std::time::Duration;

/// Why a cycle decided to transmit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendTrigger {
    /// Nothing sent since cold start
    NoBaseline,
    /// At least one field reached its threshold
    Changed(ChangedFields),
    /// The skip counter reached the forced-send limit
    Forced,
}

impl fmt::Display for SendTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendTrigger::NoBaseline => write!(f, "first reading"),
            SendTrigger::Changed(fields) => write!(f, "change in {}", fields),
            SendTrigger::Forced => write!(f, "forced"),
        }
    }
}

/// How a wake cycle ended
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// No transmission; the reading was within thresholds
    Skipped,
    /// The frame was handed to the radio
    Sent { trigger: SendTrigger, bytes: usize },
    /// The radio failed; nothing was transmitted
    RadioFault {
        trigger: SendTrigger,
        error: TransportError,
    },
}

impl CycleOutcome {
    /// True if a frame was handed to the radio
    pub fn is_sent(&self) -> bool {
        matches!(self, CycleOutcome::Sent { .. })
    }

    /// The trigger of a send attempt, if one was made
    pub fn trigger(&self) -> Option<SendTrigger> {
        match self {
            CycleOutcome::Skipped => None,
            CycleOutcome::Sent { trigger, .. } | CycleOutcome::RadioFault { trigger, .. } => {
                Some(*trigger)
            }
        }
    }
}

/// Summary of one wake cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Reading taken this cycle
    pub reading: Reading,
    /// Decision and its result
    pub outcome: CycleOutcome,
    /// Skip counter after the cycle
    pub skip_count: u32,
    /// Time spent awake, measured from WAKE to PERSIST
    pub active_time: Duration,
    /// Logical uptime after this cycle's duration was folded in
    pub accumulated_time: Duration,
}

/// Orchestrates node wake cycles
pub struct DutyCycleEngine<S, T, P, C = MonotonicClock> {
    config: NodeConfig,
    detector: ChangeDetector,
    sensor: S,
    radio: T,
    power: P,
    clock: C,
}

impl<S, T, P> DutyCycleEngine<S, T, P, MonotonicClock>
where
    S: SensorProvider,
    T: Transport,
    P: PowerControl,
{
    /// Create an engine timing its cycles with the system monotonic clock
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate.
    pub fn new(config: NodeConfig, sensor: S, radio: T, power: P) -> Result<Self, ConfigError> {
        Self::with_clock(config, sensor, radio, power, MonotonicClock::new())
    }
}

impl<S, T, P, C> DutyCycleEngine<S, T, P, C>
where
    S: SensorProvider,
    T: Transport,
    P: PowerControl,
    C: Clock,
{
    /// Create an engine with a custom clock
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate.
    pub fn with_clock(
        config: NodeConfig,
        sensor: S,
        radio: T,
        power: P,
        clock: C,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            detector: ChangeDetector::new(config.thresholds),
            config,
            sensor,
            radio,
            power,
            clock,
        })
    }

    /// Run one full wake cycle against a retained region
    ///
    /// Resumes the retained state (cold start if the region is empty),
    /// runs the cycle, writes the state back and suspends. A failure to
    /// write the region is logged; the next wake then cold-starts.
    pub fn wake<R: RetainedRegion + ?Sized>(&mut self, region: &mut R) -> CycleReport {
        let mut state = region.resume();
        let report = self.run_cycle(&mut state);
        if let Err(e) = region.store(&state) {
            log::error!("Failed to retain state, next wake will cold start: {}", e);
        }
        self.suspend();
        report
    }

    /// WAKE through PERSIST, without suspending
    pub fn run_cycle(&mut self, state: &mut PersistentState) -> CycleReport {
        // WAKE
        let wake_at = self.clock.now();
        let skips_at_wake = state.skip_count();

        // MEASURE
        let reading = self.sensor.sample();
        log::debug!("Measured {}", reading);

        // EVALUATE
        let trigger = match self.detector.evaluate(&reading, state.last_sent()) {
            Evaluation::NoBaseline => Some(SendTrigger::NoBaseline),
            Evaluation::Changed(fields) => Some(SendTrigger::Changed(fields)),
            Evaluation::Unchanged => {
                let skips = state.record_unchanged(self.config.force_send_limit);
                if skips >= self.config.force_send_limit {
                    Some(SendTrigger::Forced)
                } else {
                    None
                }
            }
        };

        // SKIP | SEND
        let outcome = match trigger {
            None => {
                log::info!(
                    "Skipped: no significant change ({}/{})",
                    state.skip_count(),
                    self.config.force_send_limit
                );
                CycleOutcome::Skipped
            }
            Some(trigger) => self.send(state, &reading, trigger, skips_at_wake),
        };

        // PERSIST
        let active_time = self.clock.now().saturating_sub(wake_at);
        state.advance(active_time.saturating_add(self.config.sleep_duration));

        CycleReport {
            reading,
            outcome,
            skip_count: state.skip_count(),
            active_time,
            accumulated_time: state.accumulated_time(),
        }
    }

    /// SUSPEND for the configured sleep duration
    pub fn suspend(&mut self) {
        log::debug!("Suspending for {:?}", self.config.sleep_duration);
        self.power.suspend(self.config.sleep_duration);
    }

    fn send(
        &mut self,
        state: &mut PersistentState,
        reading: &Reading,
        trigger: SendTrigger,
        skips_at_wake: u32,
    ) -> CycleOutcome {
        // Committed before the radio is touched
        let commit = state.commit_send(reading.clone());

        let result = self.transmit(reading);
        self.radio.sleep();

        match result {
            Ok(bytes) => {
                state.mark_sent();
                log::info!("Sent {} bytes ({}): {}", bytes, trigger, reading);
                CycleOutcome::Sent { trigger, bytes }
            }
            Err(error) => {
                match self.config.commit_policy {
                    CommitPolicy::Optimistic => {
                        log::warn!("Radio fault ({}), reading dropped: {}", trigger, error);
                    }
                    CommitPolicy::RollbackOnFault => {
                        state.roll_back(commit.with_skip_count(skips_at_wake));
                        log::warn!(
                            "Radio fault ({}), send commit rolled back: {}",
                            trigger,
                            error
                        );
                    }
                }
                CycleOutcome::RadioFault { trigger, error }
            }
        }
    }

    fn transmit(&mut self, reading: &Reading) -> Result<usize, TransportError> {
        self.radio.begin(&self.config.radio)?;
        let frame = codec::encode(reading);
        self.radio.send(&frame)?;
        Ok(frame.len())
    }

    /// Get the engine configuration
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Get the sensor provider
    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    /// Get the radio transport
    pub fn radio(&self) -> &T {
        &self.radio
    }

    /// Get mutable access to the radio transport
    pub fn radio_mut(&mut self) -> &mut T {
        &mut self.radio
    }

    /// Get the power controller
    pub fn power(&self) -> &P {
        &self.power
    }
}
