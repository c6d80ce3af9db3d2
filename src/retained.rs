// LoRa Telemetry - Adaptive duty-cycle sensor node
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Retained state module
//!
//! A node powers fully down between wake cycles. Everything in ordinary
//! memory is lost; only the values in [`PersistentState`] survive, held
//! in a [`RetainedRegion`] (RTC retention RAM on hardware).
//!
//! Lifecycle of a region:
//!
//! ```text
//! cold power-on ──► empty ──► cold_start() state
//!                               │
//!        ┌──────── load ◄───────┤  every wake
//!        ▼                      │
//!   engine cycle ──── store ────┘
//!
//! cold power loss ──► clear() ──► empty
//! ```
//!
//! Only the duty-cycle engine mutates a [`PersistentState`]; other code
//! gets read access through the getters.

use crate::error::RetentionError;
use crate::protocol::Reading;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Values that survive a power-down between wake cycles
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersistentState {
    last_sent: Option<Reading>,
    skip_count: u32,
    accumulated_time: Duration,
    last_send_time: Option<Duration>,
}

impl PersistentState {
    /// State after a cold power-on: nothing sent, no time elapsed
    pub fn cold_start() -> Self {
        Self::default()
    }

    /// Last reading committed as sent, if any
    pub fn last_sent(&self) -> Option<&Reading> {
        self.last_sent.as_ref()
    }

    /// Consecutive unchanged cycles since the last send
    pub fn skip_count(&self) -> u32 {
        self.skip_count
    }

    /// Logical uptime: active plus suspended time over all cycles
    pub fn accumulated_time(&self) -> Duration {
        self.accumulated_time
    }

    /// Logical time of the most recent successful send
    pub fn last_send_time(&self) -> Option<Duration> {
        self.last_send_time
    }

    /// True until the first send is committed
    pub fn is_cold(&self) -> bool {
        self.last_sent.is_none()
    }

    /// Logical time elapsed since the most recent successful send
    pub fn time_since_last_send(&self) -> Option<Duration> {
        self.last_send_time
            .map(|at| self.accumulated_time.saturating_sub(at))
    }

    /// Count one more unchanged cycle, saturating at `limit`
    pub(crate) fn record_unchanged(&mut self, limit: u32) -> u32 {
        self.skip_count = self.skip_count.saturating_add(1).min(limit);
        self.skip_count
    }

    /// Commit `reading` as sent and reset the skip counter
    ///
    /// Returns what was overwritten so a caller can roll back.
    pub(crate) fn commit_send(&mut self, reading: Reading) -> SendCommit {
        let previous = SendCommit {
            last_sent: self.last_sent.take(),
            skip_count: self.skip_count,
        };
        self.skip_count = 0;
        self.last_sent = Some(reading);
        previous
    }

    /// Undo a [`commit_send`](Self::commit_send)
    pub(crate) fn roll_back(&mut self, commit: SendCommit) {
        self.last_sent = commit.last_sent;
        self.skip_count = commit.skip_count;
    }

    /// Record that a transmission left the radio at the current logical time
    pub(crate) fn mark_sent(&mut self) {
        self.last_send_time = Some(self.accumulated_time);
    }

    /// Fold one cycle's duration into the logical clock
    pub(crate) fn advance(&mut self, elapsed: Duration) {
        self.accumulated_time = self
            .accumulated_time
            .checked_add(elapsed)
            .unwrap_or(Duration::MAX);
    }
}

/// Values overwritten by a send commit
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SendCommit {
    last_sent: Option<Reading>,
    skip_count: u32,
}

impl SendCommit {
    /// Override the skip count restored on roll back
    pub(crate) fn with_skip_count(mut self, skip_count: u32) -> Self {
        self.skip_count = skip_count;
        self
    }
}

/// Storage that holds a [`PersistentState`] across suspension
pub trait RetainedRegion {
    /// Read the retained state; `None` if the region is empty
    fn load(&mut self) -> Result<Option<PersistentState>, RetentionError>;

    /// Write the retained state
    fn store(&mut self, state: &PersistentState) -> Result<(), RetentionError>;

    /// Drop the retained state, as a cold power loss would
    fn clear(&mut self) -> Result<(), RetentionError>;

    /// Read the retained state, cold-starting if it is empty or unreadable
    fn resume(&mut self) -> PersistentState {
        match self.load() {
            Ok(Some(state)) => state,
            Ok(None) => {
                log::info!("Retained region empty, cold start");
                PersistentState::cold_start()
            }
            Err(e) => {
                log::warn!("Retained region unreadable ({}), cold start", e);
                PersistentState::cold_start()
            }
        }
    }
}

/// Retained region living in process memory
#[derive(Debug, Default)]
pub struct MemoryRetention {
    slot: Option<PersistentState>,
}

impl MemoryRetention {
    /// Create an empty region
    pub fn new() -> Self {
        Self::default()
    }
}

impl RetainedRegion for MemoryRetention {
    fn load(&mut self) -> Result<Option<PersistentState>, RetentionError> {
        Ok(self.slot.clone())
    }

    fn store(&mut self, state: &PersistentState) -> Result<(), RetentionError> {
        self.slot = Some(state.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), RetentionError> {
        self.slot = None;
        Ok(())
    }
}

/// Retained region backed by a JSON snapshot file
///
/// Lets a host process exit between cycles (a real power-down) and pick
/// up where it left off on the next invocation.
#[derive(Debug, Clone)]
pub struct FileRetention {
    path: PathBuf,
}

impl FileRetention {
    /// Use the snapshot at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Snapshot location
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        PathBuf::from(staging)
    }
}

impl RetainedRegion for FileRetention {
    fn load(&mut self) -> Result<Option<PersistentState>, RetentionError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn store(&mut self, state: &PersistentState) -> Result<(), RetentionError> {
        let bytes = serde_json::to_vec_pretty(state)?;
        let staging = self.staging_path();
        fs::write(&staging, bytes)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), RetentionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
