// LoRa Bridge - Host side of the gateway stream
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Host bridge
//!
//! Pipe the gateway's stdout into this process:
//!
//! ```text
//! lora-gateway | lora-bridge --output records.jsonl
//! lora-gateway | lora-bridge --server http://localhost:8000/api/sensor
//! ```

use anyhow::Context;
use clap::Parser;
use lora_bridge::{BridgeStats, HostBridge, HttpSink, RecordSink};
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// Validate gateway records and emit them as JSON lines
#[derive(Parser, Debug)]
#[command(name = "lora-bridge")]
#[command(about = "Validate gateway records and stamp them with reception time")]
#[command(version)]
struct Args {
    /// Read the gateway stream from a file instead of stdin
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Append accepted records to a file instead of stdout
    #[arg(short, long, conflicts_with = "server")]
    output: Option<PathBuf>,

    /// POST accepted records to a collection server instead
    #[arg(short, long)]
    server: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,

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

fn pump<S: RecordSink>(mut bridge: HostBridge<S>, input: Option<&PathBuf>) -> anyhow::Result<BridgeStats> {
    let stats = match input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
            bridge.run(BufReader::new(file))?
        }
        None => bridge.run(io::stdin().lock())?,
    };
    Ok(stats)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    info!("LoRa Bridge v{}", env!("CARGO_PKG_VERSION"));

    let stats = match &args.server {
        Some(url) => {
            let sink = HttpSink::with_timeout(url.as_str(), Duration::from_secs(args.timeout_secs))
                .context("Failed to build HTTP client")?;
            info!("Forwarding records to {}", sink.url());
            pump(HostBridge::new(sink), args.input.as_ref())?
        }
        None => {
            let sink: Box<dyn Write> = match &args.output {
                Some(path) => Box::new(
                    OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(path)
                        .with_context(|| format!("Failed to open {}", path.display()))?,
                ),
                None => Box::new(io::stdout().lock()),
            };
            pump(HostBridge::new(sink), args.input.as_ref())?
        }
    };

    info!("Stream ended: {}", stats);
    Ok(())
}
