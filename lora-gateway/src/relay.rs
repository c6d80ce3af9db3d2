// LoRa Gateway - Relay from radio to host
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Radio-to-host relay loop
//!
//! The [`GatewayRelay`] owns a [`Receiver`] and a host stream. Each inbound
//! packet is drained, stamped with the link metadata of that packet and
//! written to the host as one `DATA:` line.
//!
//! # Example
//!
//! ```rust
//! use lora_gateway::GatewayRelay;
//! use lora_telemetry::{LinkQuality, MemoryReceiver};
//!
//! let mut receiver = MemoryReceiver::new();
//! receiver.push_incoming(b"{\"sensor_id\":\"A\"}".to_vec(), LinkQuality::new(-42, 7.5));
//!
//! let mut relay = GatewayRelay::new(receiver, Vec::new());
//! relay.start().unwrap();
//! let stats = relay.run().unwrap();
//! assert_eq!(stats.forwarded, 1);
//!
//! let host = String::from_utf8(relay.into_host()).unwrap();
//! assert_eq!(
//!     host,
//!     "READY:Gateway_Online\nDATA:{\"sensor_id\":\"A\",\"rssi\":-42,\"snr\":7.5}\n"
//! );
//! ```

use crate::error::{GatewayError, Result};
use lora_telemetry::codec;
use lora_telemetry::framing::GATEWAY_ONLINE;
use lora_telemetry::{HostLine, LinkQuality, RadioConfig, Receiver};
use std::fmt;
use std::io::Write;
use std::time::Duration;

/// Back-off between consecutive receive failures
///
/// The delay doubles with each consecutive failure up to `max_delay`.
/// After `max_retries` consecutive failures the relay gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Consecutive failures tolerated before `run` returns the error
    pub max_retries: u32,
    /// Delay after the first failure
    pub initial_delay: Duration,
    /// Upper bound on the delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 10,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry `attempt` (0-indexed), `None` once retries are exhausted
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        Some(
            self.initial_delay
                .checked_mul(factor)
                .unwrap_or(self.max_delay)
                .min(self.max_delay),
        )
    }
}

/// What happened to one inbound packet
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    /// Augmented and written to the host
    Forwarded { bytes: usize, link: LinkQuality },
    /// Not a record; logged and discarded
    Dropped { bytes: usize, reason: String },
}

/// Relay counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Packets taken from the receiver
    pub received: u64,
    /// Packets written to the host
    pub forwarded: u64,
    /// Malformed packets discarded
    pub dropped: u64,
}

impl fmt::Display for RelayStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "received={} forwarded={} dropped={}",
            self.received, self.forwarded, self.dropped
        )
    }
}

/// Forwards radio packets to a host stream
pub struct GatewayRelay<R, W> {
    receiver: R,
    host: W,
    radio: RadioConfig,
    retry: RetryPolicy,
    /// Reused across packets; cleared before each drain
    buffer: Vec<u8>,
    stats: RelayStats,
}

impl<R: Receiver, W: Write> GatewayRelay<R, W> {
    /// Create a relay using the default radio parameters
    pub fn new(receiver: R, host: W) -> Self {
        Self::with_radio(receiver, host, RadioConfig::default())
    }

    /// Create a relay with specific radio parameters
    pub fn with_radio(receiver: R, host: W, radio: RadioConfig) -> Self {
        Self {
            receiver,
            host,
            radio,
            retry: RetryPolicy::default(),
            buffer: Vec::new(),
            stats: RelayStats::default(),
        }
    }

    /// Replace the receive back-off policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Bring the link up and announce the outcome to the host
    ///
    /// Writes `READY:Gateway_Online` on success. On failure writes
    /// `ERROR:<reason>` and returns [`GatewayError::LinkBringUp`]; the
    /// relay cannot be used after that.
    pub fn start(&mut self) -> Result<()> {
        match self.receiver.begin(&self.radio) {
            Ok(()) => {
                log::info!("Link up at {} Hz", self.radio.frequency_hz);
                self.emit(&HostLine::Ready(GATEWAY_ONLINE.to_string()))?;
                Ok(())
            }
            Err(e) => {
                log::error!("Link bring-up failed: {}", e);
                self.emit(&HostLine::Error(e.to_string()))?;
                Err(GatewayError::LinkBringUp(e))
            }
        }
    }

    /// Wait for one packet and relay it
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Receive`] if the receiver fails or is closed,
    /// and [`GatewayError::Host`] if the host stream cannot be written.
    /// A malformed packet is not an error; it yields [`RelayEvent::Dropped`].
    pub fn process_next(&mut self) -> Result<RelayEvent> {
        self.receiver.wait_packet()?;

        self.buffer.clear();
        let bytes = self.receiver.drain(&mut self.buffer);
        // Metadata belongs to the packet just drained
        let link = self.receiver.link_quality();
        self.stats.received += 1;

        match self.frame_line(link) {
            Ok(line) => {
                self.emit(&line)?;
                self.stats.forwarded += 1;
                log::debug!("Forwarded {} bytes ({})", bytes, link);
                Ok(RelayEvent::Forwarded { bytes, link })
            }
            Err(reason) => {
                self.stats.dropped += 1;
                log::warn!("Dropped malformed packet of {} bytes: {}", bytes, reason);
                Ok(RelayEvent::Dropped { bytes, reason })
            }
        }
    }

    /// Relay packets until the receiver closes
    ///
    /// Receive errors other than closure are logged and retried after the
    /// [`RetryPolicy`] delay. Once the policy is exhausted the last receive
    /// error is returned. Host stream errors end the loop immediately.
    pub fn run(&mut self) -> Result<RelayStats> {
        let mut failures = 0u32;
        loop {
            match self.process_next() {
                Ok(_) => failures = 0,
                Err(e) if e.is_closed() => {
                    log::info!("Receiver closed ({})", self.stats);
                    return Ok(self.stats);
                }
                Err(GatewayError::Receive(e)) => match self.retry.delay_for_attempt(failures) {
                    Some(delay) => {
                        failures += 1;
                        log::warn!("Receive failed, retrying in {:?}: {}", delay, e);
                        std::thread::sleep(delay);
                    }
                    None => {
                        log::error!("Receive failed {} times in a row, giving up", failures + 1);
                        return Err(GatewayError::Receive(e));
                    }
                },
                Err(e) => return Err(e),
            }
        }
    }

    fn frame_line(&self, link: LinkQuality) -> std::result::Result<HostLine, String> {
        codec::augment_text(&self.buffer, link)
            .map(HostLine::Data)
            .map_err(|e| e.to_string())
    }

    fn emit(&mut self, line: &HostLine) -> Result<()> {
        self.host.write_all(line.to_line().as_bytes())?;
        self.host.flush()?;
        Ok(())
    }

    /// Get relay counters
    pub fn stats(&self) -> RelayStats {
        self.stats
    }

    /// Get the receiver
    pub fn receiver(&self) -> &R {
        &self.receiver
    }

    /// Get mutable access to the receiver
    pub fn receiver_mut(&mut self) -> &mut R {
        &mut self.receiver
    }

    /// Consume the relay and return the host stream
    pub fn into_host(self) -> W {
        self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lora_telemetry::{MemoryReceiver, TransportError};
    use std::collections::VecDeque;

    /// Replays a script of receive results, then reports closure
    struct ScriptedReceiver {
        script: VecDeque<std::result::Result<Vec<u8>, TransportError>>,
        packet: Vec<u8>,
        polls: u32,
    }

    impl ScriptedReceiver {
        fn new(script: Vec<std::result::Result<Vec<u8>, TransportError>>) -> Self {
            Self {
                script: script.into(),
                packet: Vec::new(),
                polls: 0,
            }
        }
    }

    impl Receiver for ScriptedReceiver {
        fn begin(&mut self, _config: &RadioConfig) -> std::result::Result<(), TransportError> {
            Ok(())
        }

        fn wait_packet(&mut self) -> std::result::Result<usize, TransportError> {
            self.polls += 1;
            let packet = self.script.pop_front().unwrap_or(Err(TransportError::Closed))?;
            self.packet = packet;
            Ok(self.packet.len())
        }

        fn drain(&mut self, buf: &mut Vec<u8>) -> usize {
            let n = self.packet.len();
            buf.append(&mut self.packet);
            n
        }

        fn link_quality(&self) -> LinkQuality {
            LinkQuality::new(-42, 7.5)
        }
    }

    fn socket_error() -> TransportError {
        TransportError::Io("connection refused".to_string())
    }

    fn quick_retry(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    fn relay_with(packets: &[&[u8]]) -> GatewayRelay<MemoryReceiver, Vec<u8>> {
        let mut receiver = MemoryReceiver::new();
        for packet in packets {
            receiver.push_incoming(packet.to_vec(), LinkQuality::new(-42, 7.5));
        }
        GatewayRelay::new(receiver, Vec::new())
    }

    fn host_text(relay: GatewayRelay<MemoryReceiver, Vec<u8>>) -> String {
        String::from_utf8(relay.into_host()).unwrap()
    }

    #[test]
    fn test_start_announces_ready() {
        let mut relay = relay_with(&[]);
        relay.start().unwrap();
        assert_eq!(host_text(relay), "READY:Gateway_Online\n");
    }

    #[test]
    fn test_start_failure_reports_error_line() {
        let mut relay = GatewayRelay::new(MemoryReceiver::with_init_failure("no SX1276"), Vec::new());
        let err = relay.start().unwrap_err();
        assert!(matches!(
            err,
            GatewayError::LinkBringUp(TransportError::InitFailed { .. })
        ));
        let host = host_text(relay);
        assert!(host.starts_with("ERROR:"));
        assert!(host.contains("no SX1276"));
        assert!(host.ends_with('\n'));
    }

    #[test]
    fn test_process_next_forwards() {
        let mut relay = relay_with(&[b"{\"a\":1}"]);
        let event = relay.process_next().unwrap();
        assert_eq!(
            event,
            RelayEvent::Forwarded {
                bytes: 7,
                link: LinkQuality::new(-42, 7.5)
            }
        );
        assert_eq!(host_text(relay), "DATA:{\"a\":1,\"rssi\":-42,\"snr\":7.5}\n");
    }

    #[test]
    fn test_missing_delimiter_dropped() {
        let mut relay = relay_with(&[b"{\"a\":1", b"{\"b\":2}"]);
        assert!(matches!(
            relay.process_next().unwrap(),
            RelayEvent::Dropped { bytes: 6, .. }
        ));
        assert!(matches!(
            relay.process_next().unwrap(),
            RelayEvent::Forwarded { .. }
        ));
        assert_eq!(host_text(relay), "DATA:{\"b\":2,\"rssi\":-42,\"snr\":7.5}\n");
    }

    #[test]
    fn test_invalid_utf8_dropped() {
        let mut relay = relay_with(&[b"{\"a\":\xff}"]);
        assert!(matches!(
            relay.process_next().unwrap(),
            RelayEvent::Dropped { .. }
        ));
        assert_eq!(relay.stats().dropped, 1);
    }

    #[test]
    fn test_run_until_closed() {
        let mut relay = relay_with(&[b"{}", b"", b"{\"x\":0}"]);
        let stats = relay.run().unwrap();
        assert_eq!(
            stats,
            RelayStats {
                received: 3,
                forwarded: 2,
                dropped: 1
            }
        );
        assert_eq!(stats.to_string(), "received=3 forwarded=2 dropped=1");
    }

    #[test]
    fn test_link_quality_per_packet() {
        let mut receiver = MemoryReceiver::new();
        receiver.push_incoming(b"{}".to_vec(), LinkQuality::new(-40, 9.0));
        receiver.push_incoming(b"{}".to_vec(), LinkQuality::new(-110, -12.0));
        let mut relay = GatewayRelay::new(receiver, Vec::new());
        relay.run().unwrap();
        assert_eq!(
            host_text(relay),
            "DATA:{,\"rssi\":-40,\"snr\":9.0}\nDATA:{,\"rssi\":-110,\"snr\":-12.0}\n"
        );
    }

    #[test]
    fn test_retry_delays_double_up_to_cap() {
        let retry = RetryPolicy::default();
        assert_eq!(retry.delay_for_attempt(0), Some(Duration::from_millis(50)));
        assert_eq!(retry.delay_for_attempt(1), Some(Duration::from_millis(100)));
        assert_eq!(retry.delay_for_attempt(5), Some(Duration::from_millis(1600)));
        assert_eq!(retry.delay_for_attempt(6), Some(Duration::from_secs(2)));
        assert_eq!(retry.delay_for_attempt(9), Some(Duration::from_secs(2)));
        assert_eq!(retry.delay_for_attempt(10), None);
    }

    #[test]
    fn test_run_recovers_from_transient_receive_errors() {
        let receiver = ScriptedReceiver::new(vec![
            Err(socket_error()),
            Err(socket_error()),
            Ok(b"{}".to_vec()),
            Err(socket_error()),
            Ok(b"{}".to_vec()),
        ]);
        let mut relay = GatewayRelay::new(receiver, Vec::new()).with_retry(quick_retry(2));

        let stats = relay.run().unwrap();

        assert_eq!(stats.forwarded, 2);
        assert_eq!(relay.receiver().polls, 6);
    }

    #[test]
    fn test_run_gives_up_on_persistent_receive_errors() {
        let receiver = ScriptedReceiver::new((0..10).map(|_| Err(socket_error())).collect());
        let mut relay = GatewayRelay::new(receiver, Vec::new()).with_retry(quick_retry(3));

        let err = relay.run().unwrap_err();

        assert!(matches!(err, GatewayError::Receive(TransportError::Io(_))));
        assert!(!err.is_closed());
        assert_eq!(relay.receiver().polls, 4);
        assert!(relay.into_host().is_empty());
    }
}
