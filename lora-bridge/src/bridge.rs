// LoRa Bridge - Host side of the gateway stream
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Gateway stream consumer
//!
//! Reads the gateway's host stream line by line. `DATA:` records are
//! validated, stamped with their reception time and handed to a
//! [`RecordSink`]. Gateway status lines are logged.

use crate::error::Result;
use crate::sink::RecordSink;
use crate::stats::BridgeStats;
use crate::validate::{validate, RejectReason, ValidatedRecord};
use chrono::{DateTime, Utc};
use lora_telemetry::HostLine;
use serde::Serialize;
use std::io::BufRead;

/// An accepted record with its reception time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StampedRecord {
    #[serde(flatten)]
    pub record: ValidatedRecord,
    pub received_at: DateTime<Utc>,
}

/// What the bridge did with one line
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// Record taken by the sink
    Accepted(StampedRecord),
    /// Record valid but the sink could not deliver it
    Undelivered { record: StampedRecord, reason: String },
    /// Record failed validation
    Rejected(RejectReason),
    /// Gateway status or console line, logged only
    Status(HostLine),
    /// Blank line
    Ignored,
}

/// Validates gateway records and forwards them to a sink
pub struct HostBridge<S> {
    sink: S,
    stats: BridgeStats,
}

impl<S: RecordSink> HostBridge<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            stats: BridgeStats::default(),
        }
    }

    /// Handle one line, stamping accepted records with the current time
    pub fn handle_line(&mut self, line: &str) -> Result<LineOutcome> {
        self.handle_line_at(line, Utc::now())
    }

    /// Handle one line, stamping accepted records with `now`
    pub fn handle_line_at(&mut self, line: &str, now: DateTime<Utc>) -> Result<LineOutcome> {
        let parsed = match HostLine::parse(line) {
            Some(parsed) => parsed,
            None => return Ok(LineOutcome::Ignored),
        };

        let body = match parsed {
            HostLine::Data(body) => body,
            status => {
                log_status(&status);
                return Ok(LineOutcome::Status(status));
            }
        };

        self.stats.received += 1;
        let record = match validate(&body) {
            Ok(record) => record,
            Err(reason) => {
                self.stats.rejected += 1;
                log::warn!("Rejected record: {}", reason);
                return Ok(LineOutcome::Rejected(reason));
            }
        };

        self.stats.accepted += 1;
        let stamped = StampedRecord {
            record,
            received_at: now,
        };
        match self.sink.deliver(&stamped) {
            Ok(()) => {
                self.stats.forwarded += 1;
                log::info!(
                    "Forwarded #{} from {}",
                    self.stats.forwarded,
                    stamped.record.sensor_id
                );
                Ok(LineOutcome::Accepted(stamped))
            }
            Err(e) if e.is_delivery_failure() => {
                self.stats.failed += 1;
                log::warn!(
                    "Could not deliver record from {}: {}",
                    stamped.record.sensor_id,
                    e
                );
                Ok(LineOutcome::Undelivered {
                    record: stamped,
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Consume the stream until end of input
    ///
    /// Bytes that are not valid UTF-8 are replaced rather than failing
    /// the line.
    pub fn run<R: BufRead>(&mut self, mut input: R) -> Result<BridgeStats> {
        let mut raw = Vec::new();
        loop {
            raw.clear();
            if input.read_until(b'\n', &mut raw)? == 0 {
                return Ok(self.stats);
            }
            let line = String::from_utf8_lossy(&raw);
            self.handle_line(&line)?;
        }
    }

    /// Get bridge counters
    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    /// Get the sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the bridge and return the sink
    pub fn into_sink(self) -> S {
        self.sink
    }
}

fn log_status(line: &HostLine) {
    match line {
        HostLine::Ready(text) => log::info!("[Gateway] ready: {}", text),
        HostLine::Error(text) => log::error!("[Gateway] error: {}", text),
        other => log::debug!("[Gateway] {}", other),
    }
}
