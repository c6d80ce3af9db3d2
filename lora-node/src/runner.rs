// LoRa Node - Duty-cycled sensor node
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Wake-cycle driver

use lora_telemetry::{
    Clock, CycleOutcome, CycleReport, DutyCycleEngine, PowerControl, RetainedRegion,
    SensorProvider, Transport,
};
use std::fmt;

/// Tally of the cycles a run went through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub sent: u64,
    pub skipped: u64,
    pub faults: u64,
}

impl RunSummary {
    /// Count one cycle
    pub fn record(&mut self, report: &CycleReport) {
        self.cycles += 1;
        match report.outcome {
            CycleOutcome::Skipped => self.skipped += 1,
            CycleOutcome::Sent { .. } => self.sent += 1,
            CycleOutcome::RadioFault { .. } => self.faults += 1,
        }
    }

    /// Fraction of cycles that kept the radio off
    pub fn skip_ratio(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.skipped as f64 / self.cycles as f64
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cycles: {} sent, {} skipped, {} radio faults",
            self.cycles, self.sent, self.skipped, self.faults
        )
    }
}

/// Run `cycles` wake cycles, or forever when `None`
pub fn run<S, T, P, C, R>(
    engine: &mut DutyCycleEngine<S, T, P, C>,
    region: &mut R,
    cycles: Option<u64>,
) -> RunSummary
where
    S: SensorProvider,
    T: Transport,
    P: PowerControl,
    C: Clock,
    R: RetainedRegion + ?Sized,
{
    let mut summary = RunSummary::default();
    loop {
        if cycles.is_some_and(|limit| summary.cycles >= limit) {
            break;
        }
        let report = engine.wake(region);
        log::debug!(
            "Cycle {} done in {:?}, uptime {:?}",
            summary.cycles + 1,
            report.active_time,
            report.accumulated_time
        );
        summary.record(&report);
    }
    summary
}
