// LoRa Node - Duty-cycled sensor node
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Development node
//!
//! Samples a simulated sensor, sends frames to the gateway over UDP when
//! they are worth sending, and sleeps between cycles.

use clap::Parser;
use lora_node::{run, NodeSettings};
use lora_telemetry::{
    CommitPolicy, DutyCycleEngine, FileRetention, MemoryRetention, RetainedRegion, ThreadSleep,
    UdpTransport,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// LoRa sensor node
#[derive(Parser, Debug)]
#[command(name = "lora-node")]
#[command(about = "Duty-cycled sensor node sending to a gateway over UDP")]
#[command(version)]
struct Args {
    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Identifier carried in every message
    #[arg(short, long)]
    sensor_id: Option<String>,

    /// Gateway address
    #[arg(short, long)]
    gateway: Option<SocketAddr>,

    /// Seconds to sleep between cycles
    #[arg(long)]
    sleep_secs: Option<f64>,

    /// Retained-state snapshot file, kept across invocations
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Number of cycles to run (default: forever)
    #[arg(short = 'n', long, conflicts_with = "once")]
    cycles: Option<u64>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Roll the send commit back when the radio fails
    #[arg(long)]
    rollback_on_fault: bool,

    /// Simulated temperature base, °C
    #[arg(long, allow_hyphen_values = true)]
    temp_base: Option<f64>,

    /// Simulated humidity base, %
    #[arg(long)]
    humidity_base: Option<f64>,

    /// Seed for a reproducible simulation
    #[arg(long)]
    seed: Option<u64>,

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

fn load_settings(args: &Args) -> anyhow::Result<NodeSettings> {
    let mut settings = match &args.config {
        Some(path) => NodeSettings::load(path)?,
        None => NodeSettings::default(),
    };

    if let Some(sensor_id) = &args.sensor_id {
        settings.node.sensor_id = sensor_id.clone();
    }
    if let Some(gateway) = args.gateway {
        settings.gateway = gateway;
    }
    if let Some(secs) = args.sleep_secs {
        settings.node.sleep_duration = Duration::try_from_secs_f64(secs)?;
    }
    if let Some(path) = &args.state_file {
        settings.state_file = Some(path.clone());
    }
    if args.rollback_on_fault {
        settings.node.commit_policy = CommitPolicy::RollbackOnFault;
    }
    if let Some(temp_base) = args.temp_base {
        settings.sensor.temp_base = temp_base;
    }
    if let Some(humidity_base) = args.humidity_base {
        settings.sensor.humidity_base = humidity_base;
    }
    if let Some(seed) = args.seed {
        settings.sensor.seed = Some(seed);
    }

    settings.validate()?;
    Ok(settings)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    info!("LoRa Node v{}", env!("CARGO_PKG_VERSION"));

    let settings = load_settings(&args)?;
    let cycles = if args.once { Some(1) } else { args.cycles };

    let mut region: Box<dyn RetainedRegion> = match &settings.state_file {
        Some(path) => {
            info!("Retaining state in {}", path.display());
            Box::new(FileRetention::new(path))
        }
        None => Box::new(MemoryRetention::new()),
    };

    let sensor = settings.sensor.build(&settings.node.sensor_id);
    let radio = UdpTransport::new(settings.gateway);
    info!(
        "Node {} -> gateway {}, sleeping {:?}",
        settings.node.sensor_id, settings.gateway, settings.node.sleep_duration
    );

    let mut engine = DutyCycleEngine::new(settings.node, sensor, radio, ThreadSleep)?;
    let summary = run(&mut engine, region.as_mut(), cycles);
    info!("{}", summary);
    Ok(())
}
