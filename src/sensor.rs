// LoRa Telemetry - Adaptive duty-cycle sensor node
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Sensor acquisition
//!
//! The engine treats acquisition as an opaque provider that always returns
//! a reading. Two host-side providers are included: a noisy simulator and
//! a scripted sequence for deterministic runs.

use crate::protocol::Reading;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Source of one reading per wake cycle
pub trait SensorProvider {
    /// Sample every quantity once
    fn sample(&mut self) -> Reading;
}

/// Simulated environmental sensor
///
/// Temperature varies ±5 °C around its base, humidity ±10 % around its
/// base (clamped to 0-100), dust uniformly within 10-50 µg/m³. Values are
/// rounded to two decimals like the real sensor driver reports them.
#[derive(Debug, Clone)]
pub struct SimulatedSensor {
    sensor_id: String,
    temp_base: f64,
    humidity_base: f64,
    rng: StdRng,
}

impl SimulatedSensor {
    /// Create a simulator seeded from the OS
    pub fn new(sensor_id: impl Into<String>, temp_base: f64, humidity_base: f64) -> Self {
        Self::with_rng(sensor_id, temp_base, humidity_base, StdRng::from_entropy())
    }

    /// Create a reproducible simulator
    pub fn with_seed(
        sensor_id: impl Into<String>,
        temp_base: f64,
        humidity_base: f64,
        seed: u64,
    ) -> Self {
        Self::with_rng(
            sensor_id,
            temp_base,
            humidity_base,
            StdRng::seed_from_u64(seed),
        )
    }

    fn with_rng(
        sensor_id: impl Into<String>,
        temp_base: f64,
        humidity_base: f64,
        rng: StdRng,
    ) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            temp_base,
            humidity_base,
            rng,
        }
    }
}

impl SensorProvider for SimulatedSensor {
    fn sample(&mut self) -> Reading {
        let temperature = self.temp_base + self.rng.gen_range(-5.0..=5.0);
        let humidity = (self.humidity_base + self.rng.gen_range(-10.0..=10.0)).clamp(0.0, 100.0);
        let dust = self.rng.gen_range(10.0..=50.0);
        Reading::new(
            self.sensor_id.clone(),
            round2(temperature),
            round2(humidity),
            round2(dust),
        )
    }
}

/// Replays a fixed sequence of readings, repeating the last one forever
#[derive(Debug, Clone)]
pub struct ScriptedSensor {
    queue: VecDeque<Reading>,
    last: Reading,
}

impl ScriptedSensor {
    /// Start the script with `first`
    pub fn new(first: Reading) -> Self {
        Self {
            queue: VecDeque::new(),
            last: first,
        }
    }

    /// Append a reading to the script
    pub fn then(mut self, next: Reading) -> Self {
        self.push(next);
        self
    }

    /// Append a reading to a running script
    pub fn push(&mut self, next: Reading) {
        self.queue.push_back(next);
    }

    /// Readings left before the script starts repeating
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl SensorProvider for ScriptedSensor {
    fn sample(&mut self) -> Reading {
        let current = self.last.clone();
        if let Some(next) = self.queue.pop_front() {
            self.last = next;
        }
        current
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
