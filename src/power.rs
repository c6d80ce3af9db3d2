//! Power and timekeeping primitives
//!
//! The node only needs two things from the board: a way to suspend for a
//! fixed duration, and a monotonic clock to measure how long it was awake.
//! The clock is not assumed to keep counting across a suspension.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Low-power suspension primitive
pub trait PowerControl {
    /// Suspend for `duration`
    ///
    /// On hardware this is a deep sleep: execution restarts at the top of
    /// the wake cycle and ordinary memory is lost. Host implementations
    /// return once the duration has elapsed.
    fn suspend(&mut self, duration: Duration);
}

/// Monotonic time source local to one wake cycle
pub trait Clock {
    /// Time elapsed since an arbitrary fixed origin
    fn now(&self) -> Duration;
}

/// Suspension by blocking the current thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleep;

impl PowerControl for ThreadSleep {
    fn suspend(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Records requested suspensions without waiting
#[derive(Debug, Default, Clone)]
pub struct RecordingPower {
    suspensions: Vec<Duration>,
}

impl RecordingPower {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every suspension requested so far, in order
    pub fn suspensions(&self) -> &[Duration] {
        &self.suspensions
    }
}

impl PowerControl for RecordingPower {
    fn suspend(&mut self, duration: Duration) {
        self.suspensions.push(duration);
    }
}

/// Clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Deterministic clock that advances by a fixed step on every read
///
/// With a step of `s`, a wake cycle that reads the clock twice measures
/// exactly `s` of active time.
#[derive(Debug, Clone)]
pub struct SteppingClock {
    now: Cell<Duration>,
    step: Duration,
}

impl SteppingClock {
    pub fn new(step: Duration) -> Self {
        Self {
            now: Cell::new(Duration::ZERO),
            step,
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> Duration {
        let current = self.now.get();
        self.now.set(current + self.step);
        current
    }
}
