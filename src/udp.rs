// LoRa Telemetry - Adaptive duty-cycle sensor node
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! UDP stand-in for the radio link
//!
//! Lets the node and gateway binaries run on a development host: one
//! datagram per LoRa frame. UDP carries no signal metadata, so the
//! receiving side reports link quality from a [`LinkModel`].

use crate::config::{RadioConfig, MAX_FRAME_SIZE};
use crate::error::TransportError;
use crate::protocol::LinkQuality;
use crate::radio::{Receiver, Transport};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

/// Transmit side sending each frame as one datagram to `target`
#[derive(Debug)]
pub struct UdpTransport {
    target: SocketAddr,
    socket: Option<UdpSocket>,
}

impl UdpTransport {
    pub fn new(target: SocketAddr) -> Self {
        Self {
            target,
            socket: None,
        }
    }
}

impl Transport for UdpTransport {
    fn begin(&mut self, _config: &RadioConfig) -> Result<(), TransportError> {
        let bind_addr = if self.target.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };
        let socket = UdpSocket::bind(bind_addr)
            .and_then(|s| s.connect(self.target).map(|()| s))
            .map_err(|e| TransportError::InitFailed {
                reason: format!("cannot reach {}: {}", self.target, e),
            })?;
        self.socket = Some(socket);
        Ok(())
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        if frame.len() > MAX_FRAME_SIZE {
            return Err(TransportError::FrameTooLarge {
                size: frame.len(),
                max: MAX_FRAME_SIZE,
            });
        }
        let socket = self.socket.as_ref().ok_or_else(|| TransportError::SendFailed {
            reason: "radio not initialized".to_string(),
        })?;
        socket.send(frame)?;
        Ok(())
    }

    fn sleep(&mut self) {
        self.socket = None;
    }
}

/// Synthetic link-quality source
#[derive(Debug, Clone)]
pub struct LinkModel {
    /// Mean RSSI in dBm
    pub rssi: i16,
    /// Mean SNR in dB
    pub snr: f32,
    /// Maximum deviation applied to each packet (RSSI dB, SNR dB)
    pub jitter: (i16, f32),
    rng: StdRng,
}

impl LinkModel {
    /// Constant metadata for every packet
    pub fn fixed(rssi: i16, snr: f32) -> Self {
        Self {
            rssi,
            snr,
            jitter: (0, 0.0),
            rng: StdRng::seed_from_u64(0),
        }
    }

    /// Metadata varying uniformly around the given means
    pub fn jittered(rssi: i16, snr: f32, jitter: (i16, f32)) -> Self {
        Self {
            rssi,
            snr,
            jitter: (jitter.0.abs(), jitter.1.abs()),
            rng: StdRng::from_entropy(),
        }
    }

    /// Metadata for the next packet
    pub fn sample(&mut self) -> LinkQuality {
        let (drssi, dsnr) = self.jitter;
        let rssi = if drssi > 0 {
            self.rssi.saturating_add(self.rng.gen_range(-drssi..=drssi))
        } else {
            self.rssi
        };
        let snr = if dsnr > 0.0 {
            self.snr + self.rng.gen_range(-dsnr..=dsnr)
        } else {
            self.snr
        };
        LinkQuality::new(rssi, snr)
    }
}

impl Default for LinkModel {
    fn default() -> Self {
        Self::jittered(-60, 9.5, (8, 1.5))
    }
}

/// Receive side listening for datagrams on `bind`
#[derive(Debug)]
pub struct UdpReceiver {
    bind: SocketAddr,
    socket: Option<UdpSocket>,
    packet: Vec<u8>,
    link: LinkQuality,
    model: LinkModel,
    truncated: u64,
}

impl UdpReceiver {
    pub fn new(bind: SocketAddr, model: LinkModel) -> Self {
        Self {
            bind,
            socket: None,
            packet: Vec::new(),
            link: LinkQuality::default(),
            model,
            truncated: 0,
        }
    }

    /// Datagrams cut down to `MAX_FRAME_SIZE`
    pub fn truncated(&self) -> u64 {
        self.truncated
    }

    /// Address actually bound, once `begin` has succeeded
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }
}

impl Receiver for UdpReceiver {
    fn begin(&mut self, _config: &RadioConfig) -> Result<(), TransportError> {
        let socket = UdpSocket::bind(self.bind).map_err(|e| TransportError::InitFailed {
            reason: format!("cannot listen on {}: {}", self.bind, e),
        })?;
        self.socket = Some(socket);
        Ok(())
    }

    fn wait_packet(&mut self) -> Result<usize, TransportError> {
        let socket = self.socket.as_ref().ok_or(TransportError::Closed)?;
        let mut buf = [0u8; MAX_FRAME_SIZE + 1];
        let (len, from) = socket.recv_from(&mut buf)?;
        log::trace!("Datagram of {} bytes from {}", len, from);
        if len > MAX_FRAME_SIZE {
            self.truncated += 1;
            log::warn!(
                "Datagram from {} exceeds {} bytes, truncated",
                from,
                MAX_FRAME_SIZE
            );
        }
        self.packet.clear();
        self.packet.extend_from_slice(&buf[..len.min(MAX_FRAME_SIZE)]);
        self.link = self.model.sample();
        Ok(self.packet.len())
    }

    fn drain(&mut self, buf: &mut Vec<u8>) -> usize {
        let n = self.packet.len();
        buf.append(&mut self.packet);
        n
    }

    fn link_quality(&self) -> LinkQuality {
        self.link
    }
}
