// LoRa Gateway - Relay from radio to host
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Development gateway
//!
//! Listens for node frames on UDP and writes the host stream to stdout.
//! Logs go to stderr.

use clap::Parser;
use lora_gateway::{GatewayConfig, GatewayError, GatewayRelay, LinkSettings};
use lora_telemetry::UdpReceiver;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// LoRa gateway relay
#[derive(Parser, Debug)]
#[command(name = "lora-gateway")]
#[command(about = "Relay node frames to the host stream on stdout")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on for node frames
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Report a constant RSSI (dBm) for every packet
    #[arg(long, allow_hyphen_values = true)]
    rssi: Option<i16>,

    /// Report a constant SNR (dB) for every packet
    #[arg(long, allow_hyphen_values = true)]
    snr: Option<f32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> anyhow::Result<GatewayConfig> {
    let mut config = match &args.config {
        Some(path) => GatewayConfig::load(path)?,
        None => GatewayConfig::default(),
    };

    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    if args.rssi.is_some() || args.snr.is_some() {
        config.link = LinkSettings::fixed(
            args.rssi.unwrap_or(config.link.rssi),
            args.snr.unwrap_or(config.link.snr),
        );
    }

    config.validate().map_err(GatewayError::from)?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    info!("LoRa Gateway v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args)?;
    info!("Listening for node frames on {}", config.listen);

    let receiver = UdpReceiver::new(config.listen, config.link.model());
    let stdout = std::io::stdout().lock();
    let mut relay = GatewayRelay::with_radio(receiver, stdout, config.radio.clone());

    relay.start()?;
    let stats = relay.run()?;
    info!("Relay stopped: {}", stats);
    Ok(())
}
