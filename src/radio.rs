// LoRa Telemetry - Adaptive duty-cycle sensor node
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.


//! Radio abstraction module
//!
//! This module provides the traits the node and gateway use to reach the
//! radio, plus in-memory implementations for tests and local simulation.
//!
//! Delivery is best effort on both sides: no acknowledgment, no retry.

use crate::config::{RadioConfig, MAX_FRAME_SIZE};
use crate::error::TransportError;
use crate::protocol::LinkQuality;
use std::collections::VecDeque;

/// Statistics about link usage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkMetrics {
    /// Total bytes sent
    pub bytes_sent: u64,
    /// Total bytes received
    pub bytes_received: u64,
    /// Total frames sent
    pub frames_sent: u64,
    /// Total frames received
    pub frames_received: u64,
    /// Frames lost on the air or overwritten before being read
    pub frames_lost: u64,
}

/// Transmit side of the radio, used by the node
pub trait Transport {
    /// Bring the radio up with the given parameters
    fn begin(&mut self, config: &RadioConfig) -> Result<(), TransportError>;

    /// Transmit one frame (fire and forget)
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError>;

    /// Put the radio into its lowest-power state
    fn sleep(&mut self) {}
}

/// Receive side of the radio, used by the gateway
///
/// Link metadata is only available for the most recently completed
/// packet, so it must be read right after [`drain`](Receiver::drain) and
/// before waiting for the next packet.
pub trait Receiver {
    /// Bring the radio up with the given parameters
    fn begin(&mut self, config: &RadioConfig) -> Result<(), TransportError>;

    /// Block until a packet has been received; returns its length
    fn wait_packet(&mut self) -> Result<usize, TransportError>;

    /// Move the bytes of the current packet into `buf`, returning the count
    fn drain(&mut self, buf: &mut Vec<u8>) -> usize;

    /// Metadata of the most recently completed packet
    fn link_quality(&self) -> LinkQuality;
}

/// In-memory transmit side
#[derive(Debug)]
pub struct MemoryTransport {
    /// Outgoing frames (send buffer)
    tx_buffer: VecDeque<Vec<u8>>,
    /// Reason to fail `begin`, if set
    init_failure: Option<String>,
    /// Whether `begin` has succeeded since the last sleep
    is_up: bool,
    /// Number of `begin` calls
    begin_calls: u32,
    /// Metrics
    metrics: LinkMetrics,
}

impl MemoryTransport {
    /// Create a transport that always comes up
    pub fn new() -> Self {
        Self {
            tx_buffer: VecDeque::new(),
            init_failure: None,
            is_up: false,
            begin_calls: 0,
            metrics: LinkMetrics::default(),
        }
    }

    /// Create a transport whose `begin` fails with `reason`
    pub fn with_init_failure(reason: impl Into<String>) -> Self {
        Self {
            init_failure: Some(reason.into()),
            ..Self::new()
        }
    }

    /// Make subsequent `begin` calls fail (`Some`) or succeed (`None`)
    pub fn set_init_failure(&mut self, reason: Option<String>) {
        self.init_failure = reason;
    }

    /// Pop a frame from the send buffer (simulate transmission)
    pub fn pop_outgoing(&mut self) -> Option<Vec<u8>> {
        self.tx_buffer.pop_front()
    }

    /// Get number of pending outgoing frames
    pub fn pending_outgoing(&self) -> usize {
        self.tx_buffer.len()
    }

    /// Whether the radio is currently up
    pub fn is_up(&self) -> bool {
        self.is_up
    }

    /// Number of times `begin` was called
    pub fn begin_calls(&self) -> u32 {
        self.begin_calls
    }

    /// Get link metrics
    pub fn metrics(&self) -> LinkMetrics {
        self.metrics.clone()
    }

    /// Deliver every pending frame to `receiver` with the given metadata
    pub fn transfer_to(&mut self, receiver: &mut MemoryReceiver, link: LinkQuality) {
        while let Some(frame) = self.tx_buffer.pop_front() {
            receiver.push_incoming(frame, link);
        }
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MemoryTransport {
    fn begin(&mut self, _config: &RadioConfig) -> Result<(), TransportError> {
        self.begin_calls += 1;
        if let Some(reason) = &self.init_failure {
            self.is_up = false;
            return Err(TransportError::InitFailed {
                reason: reason.clone(),
            });
        }
        self.is_up = true;
        Ok(())
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        if !self.is_up {
            return Err(TransportError::SendFailed {
                reason: "radio not initialized".to_string(),
            });
        }
        if frame.len() > MAX_FRAME_SIZE {
            return Err(TransportError::FrameTooLarge {
                size: frame.len(),
                max: MAX_FRAME_SIZE,
            });
        }

        self.tx_buffer.push_back(frame.to_vec());
        self.metrics.bytes_sent += frame.len() as u64;
        self.metrics.frames_sent += 1;
        Ok(())
    }

    fn sleep(&mut self) {
        self.is_up = false;
    }
}

/// Transmit side that simulates frames lost on the air
///
/// Lost frames still count as sent: the node cannot tell.
#[derive(Debug)]
pub struct LossyTransport {
    inner: MemoryTransport,
    loss_rate: f32,
    rng_state: u64,
}

impl LossyTransport {
    /// Create a new lossy transport with given loss rate (0.0-1.0)
    pub fn new(loss_rate: f32) -> Self {
        Self {
            inner: MemoryTransport::new(),
            loss_rate: loss_rate.clamp(0.0, 1.0),
            rng_state: 12345,
        }
    }

    /// Access the underlying transport
    pub fn inner_mut(&mut self) -> &mut MemoryTransport {
        &mut self.inner
    }

    /// Simple PRNG for deterministic testing
    fn next_random(&mut self) -> f32 {
        self.rng_state = self.rng_state.wrapping_mul(1103515245).wrapping_add(12345);
        ((self.rng_state >> 16) & 0x7fff) as f32 / 32767.0
    }
}

impl Transport for LossyTransport {
    fn begin(&mut self, config: &RadioConfig) -> Result<(), TransportError> {
        self.inner.begin(config)
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        if self.inner.is_up && self.next_random() < self.loss_rate {
            self.inner.metrics.bytes_sent += frame.len() as u64;
            self.inner.metrics.frames_sent += 1;
            self.inner.metrics.frames_lost += 1;
            return Ok(());
        }
        self.inner.send(frame)
    }

    fn sleep(&mut self) {
        self.inner.sleep()
    }
}

/// In-memory receive side
///
/// Holds at most `capacity` completed packets; a packet arriving while the
/// queue is full is lost, like a radio FIFO overwritten mid-processing. An
/// empty queue reports [`TransportError::Closed`] instead of blocking.
#[derive(Debug)]
pub struct MemoryReceiver {
    /// Completed packets not yet picked up
    rx_buffer: VecDeque<(Vec<u8>, LinkQuality)>,
    /// Packet currently being drained
    current: Vec<u8>,
    /// Metadata of the most recently completed packet
    last_link: LinkQuality,
    /// Maximum number of queued packets
    capacity: usize,
    /// Reason to fail `begin`, if set
    init_failure: Option<String>,
    /// Metrics
    metrics: LinkMetrics,
}

impl MemoryReceiver {
    /// Create a receiver with an effectively unbounded queue
    pub fn new() -> Self {
        Self::with_capacity(usize::MAX)
    }

    /// Create a receiver that holds at most `capacity` packets
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rx_buffer: VecDeque::new(),
            current: Vec::new(),
            last_link: LinkQuality::default(),
            capacity: capacity.max(1),
            init_failure: None,
            metrics: LinkMetrics::default(),
        }
    }

    /// Create a receiver whose `begin` fails with `reason`
    pub fn with_init_failure(reason: impl Into<String>) -> Self {
        Self {
            init_failure: Some(reason.into()),
            ..Self::new()
        }
    }

    /// Queue a received packet (simulate reception); false if it was lost
    pub fn push_incoming(&mut self, frame: Vec<u8>, link: LinkQuality) -> bool {
        if self.rx_buffer.len() >= self.capacity {
            self.metrics.frames_lost += 1;
            return false;
        }
        self.rx_buffer.push_back((frame, link));
        true
    }

    /// Get number of pending incoming packets
    pub fn pending_incoming(&self) -> usize {
        self.rx_buffer.len()
    }

    /// Get link metrics
    pub fn metrics(&self) -> LinkMetrics {
        self.metrics.clone()
    }
}

impl Default for MemoryReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl Receiver for MemoryReceiver {
    fn begin(&mut self, _config: &RadioConfig) -> Result<(), TransportError> {
        match &self.init_failure {
            Some(reason) => Err(TransportError::InitFailed {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn wait_packet(&mut self) -> Result<usize, TransportError> {
        let (frame, link) = self.rx_buffer.pop_front().ok_or(TransportError::Closed)?;
        self.metrics.bytes_received += frame.len() as u64;
        self.metrics.frames_received += 1;
        self.last_link = link;
        self.current = frame;
        Ok(self.current.len())
    }

    fn drain(&mut self, buf: &mut Vec<u8>) -> usize {
        let n = self.current.len();
        buf.append(&mut self.current);
        n
    }

    fn link_quality(&self) -> LinkQuality {
        self.last_link
    }
}
